use super::runner::ProgressCallback;
use super::{Outcome, SearchState};
use crate::scorer::DegenerateBasis;
use std::io::{self, Write};
use tracing::{debug, info, warn};

/// Writes the iteration log: one ERF line plus the sorted best basis per
/// counted iteration.
pub struct WriterSink<W: Write> {
    out: W,
    failed: bool,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // A broken log must not kill a long search; report once and go on.
    fn check(&mut self, res: io::Result<()>) {
        if let Err(e) = res {
            if !self.failed {
                warn!("Could not write iteration log: {}", e);
                self.failed = true;
            }
        }
    }
}

impl<W: Write> ProgressCallback for WriterSink<W> {
    fn on_iteration(&mut self, iteration: usize, _outcome: &Outcome, state: &SearchState) -> bool {
        let res = writeln!(
            self.out,
            "- Iteration: {}  ERF: {}",
            iteration,
            state.best_erf()
        )
        .and_then(|_| writeln!(self.out, "{:?}", state.accepted().sorted()));
        self.check(res);
        true
    }

    fn on_degenerate(&mut self, _iteration: usize, _reason: &DegenerateBasis) {
        let res = writeln!(
            self.out,
            " [Error] Too redundant basis, try to reduce the size of the basis."
        );
        self.check(res);
    }
}

/// Mirrors progress into tracing, reporting every `every` iterations.
pub struct TracingSink {
    pub every: usize,
}

impl ProgressCallback for TracingSink {
    fn on_iteration(&mut self, iteration: usize, outcome: &Outcome, state: &SearchState) -> bool {
        if let Outcome::Accepted(erf) = outcome {
            debug!("Iteration {:5} | accepted ERF {:.6}", iteration, erf);
        }
        if self.every > 0 && iteration % self.every == 0 {
            info!(
                "Iteration {:5} | Best ERF: {:.6} | {}",
                iteration,
                state.best_erf(),
                outcome
            );
        }
        true
    }

    fn on_degenerate(&mut self, iteration: usize, reason: &DegenerateBasis) {
        debug!("Iteration {:5} | {}", iteration, reason);
    }
}

/// Fans progress out to two sinks; stops when either asks to.
pub struct Tee<A, B>(pub A, pub B);

impl<A: ProgressCallback, B: ProgressCallback> ProgressCallback for Tee<A, B> {
    fn on_iteration(&mut self, iteration: usize, outcome: &Outcome, state: &SearchState) -> bool {
        let a = self.0.on_iteration(iteration, outcome, state);
        let b = self.1.on_iteration(iteration, outcome, state);
        a && b
    }

    fn on_degenerate(&mut self, iteration: usize, reason: &DegenerateBasis) {
        self.0.on_degenerate(iteration, reason);
        self.1.on_degenerate(iteration, reason);
    }
}
