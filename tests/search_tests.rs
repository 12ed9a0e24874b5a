mod common;

use basisga::api::Session;
use basisga::core_types::ReplicaIndexSet;
use basisga::error::{BasisError, FitError};
use basisga::optimizer::{Outcome, ProgressCallback, SearchState, Silent, StopReason, WriterSink};
use basisga::scorer::{CandidateScore, DegenerateBasis};

/// Records every callback for later inspection.
#[derive(Default)]
struct Recorder {
    best: Vec<f64>,
    outcomes: Vec<Outcome>,
    degenerate: usize,
    stop_after: Option<usize>,
}

impl ProgressCallback for Recorder {
    fn on_iteration(&mut self, _iteration: usize, outcome: &Outcome, state: &SearchState) -> bool {
        self.best.push(state.best_erf());
        self.outcomes.push(outcome.clone());
        self.stop_after.map_or(true, |n| self.best.len() < n)
    }

    fn on_degenerate(&mut self, _iteration: usize, _reason: &DegenerateBasis) {
        self.degenerate += 1;
    }
}

#[test]
fn test_end_to_end_small_ensemble() {
    let ens = common::synthetic_ensemble(10, 1, 4, 1);
    let session = Session::from_ensemble(ens, common::config(5, 11)).unwrap();
    let initial = session.natural_basis(3).unwrap();

    let baseline = session.evaluate(&initial).unwrap().erf().unwrap();
    let (outcome, record) = session.search(initial, &mut Silent).unwrap();

    assert_eq!(outcome.iterations, 5);
    assert_eq!(outcome.stop, StopReason::Budget);
    assert_eq!(outcome.baseline_erf, Some(baseline));
    assert!(outcome.best_erf <= baseline);
    assert!(outcome.best_erf.is_finite());

    assert_eq!(record.iterations, 5);
    assert_eq!(record.nrep, 3);
    assert_eq!(record.pdf_name, "synthetic");
    assert_eq!(record.final_erf, outcome.best_erf);
    assert_eq!(record.basis.len(), 3);
    assert!(record.basis.windows(2).all(|w| w[0] < w[1]));
    assert!(record.basis.iter().all(|id| (1..=10).contains(id)));
}

#[test]
fn test_basis_larger_than_grid_aborts_the_search() {
    let ens = common::synthetic_ensemble(10, 1, 2, 1);
    let session = Session::from_ensemble(ens, common::config(5, 11)).unwrap();
    let initial = session.natural_basis(3).unwrap();

    let err = session.search(initial, &mut Silent).unwrap_err();
    assert!(matches!(
        err,
        BasisError::Fit(FitError::Underdetermined {
            basis_size: 3,
            grid_points: 2
        })
    ));
}

#[test]
fn test_best_erf_never_increases() {
    let ens = common::synthetic_ensemble(60, 2, 4, 5);
    let session = Session::from_ensemble(ens, common::config(200, 3)).unwrap();
    let initial = session.natural_basis(5).unwrap();

    let mut rec = Recorder::default();
    let (outcome, _) = session.search(initial, &mut rec).unwrap();

    assert_eq!(rec.best.len(), 200);
    assert!(rec.best.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(*rec.best.last().unwrap(), outcome.best_erf);

    // every accepted candidate is a strict improvement
    let mut best = f64::INFINITY;
    for o in &rec.outcomes {
        if let Outcome::Accepted(erf) = o {
            assert!(*erf < best);
            best = *erf;
        }
    }
    assert_eq!(best, outcome.best_erf);

    // the reported basis scores exactly the reported ERF
    let rescored = session.evaluate(&outcome.best).unwrap().erf().unwrap();
    assert_eq!(rescored.to_bits(), outcome.best_erf.to_bits());
}

#[test]
fn test_same_seed_same_search() {
    let run = |seed| {
        let ens = common::synthetic_ensemble(50, 2, 3, 8);
        let session = Session::from_ensemble(ens, common::config(60, seed)).unwrap();
        let initial = session.natural_basis(4).unwrap();
        session.search(initial, &mut Silent).unwrap().1
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn test_callback_can_cancel() {
    let ens = common::synthetic_ensemble(30, 1, 4, 2);
    let session = Session::from_ensemble(ens, common::config(100, 1)).unwrap();
    let mut rec = Recorder {
        stop_after: Some(7),
        ..Default::default()
    };
    let (outcome, _) = session
        .search(session.natural_basis(3).unwrap(), &mut rec)
        .unwrap();
    assert_eq!(outcome.iterations, 7);
    assert_eq!(outcome.stop, StopReason::Cancelled);
}

#[test]
fn test_patience_stops_early() {
    let ens = common::synthetic_ensemble(30, 1, 4, 2);
    let mut config = common::config(10_000, 1);
    config.search.patience = Some(5);
    let session = Session::from_ensemble(ens, config).unwrap();
    let (outcome, record) = session
        .search(session.natural_basis(3).unwrap(), &mut Silent)
        .unwrap();
    assert_eq!(outcome.stop, StopReason::Patience);
    assert!(outcome.iterations < 10_000);
    // the record still reports the configured budget
    assert_eq!(record.iterations, 10_000);
}

#[test]
fn test_degenerate_baseline_is_retried() {
    let ens = common::ensemble_with_twin(30, 1, 4, 4);
    let session = Session::from_ensemble(ens, common::config(10, 6)).unwrap();
    let initial = session.basis(vec![1, 2]).unwrap();
    assert!(matches!(
        session.evaluate(&initial).unwrap(),
        CandidateScore::Degenerate(_)
    ));

    let mut rec = Recorder::default();
    let (outcome, _) = session.search(initial, &mut rec).unwrap();

    assert!(rec.degenerate >= 1);
    assert_eq!(outcome.stats.degenerate, rec.degenerate);
    assert!(outcome.baseline_erf.is_some());
    // degenerate draws do not use up iterations
    assert_eq!(outcome.iterations, 10);
    assert_eq!(rec.best.len(), 10);
    assert!(!outcome.best.has_duplicates());
}

#[test]
fn test_degenerate_retry_cap() {
    let ens = common::ensemble_with_twin(30, 1, 4, 4);
    let mut config = common::config(10, 6);
    config.search.max_degenerate_retries = 1;
    let session = Session::from_ensemble(ens, config).unwrap();
    let initial = session.basis(vec![2, 1]).unwrap();

    let mut sink = WriterSink::new(Vec::new());
    let err = session.search(initial, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        BasisError::DegenerateRetriesExhausted {
            iteration: 0,
            retries: 1
        }
    ));

    let log = String::from_utf8(sink.into_inner()).unwrap();
    assert!(log.contains("[Error] Too redundant basis"));
}

#[test]
fn test_writer_sink_log_format() {
    let ens = common::synthetic_ensemble(20, 1, 4, 12);
    let session = Session::from_ensemble(ens, common::config(3, 2)).unwrap();
    let initial = ReplicaIndexSet::new(vec![9, 4, 1], 20).unwrap();

    let mut sink = WriterSink::new(Vec::new());
    let (outcome, _) = session.search(initial, &mut sink).unwrap();
    let log = String::from_utf8(sink.into_inner()).unwrap();

    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 6);
    let re = regex::Regex::new(r"^- Iteration: (\d+)  ERF: [0-9.eE+-]+$").unwrap();
    for (i, pair) in lines.chunks(2).enumerate() {
        let caps = re.captures(pair[0]).unwrap();
        assert_eq!(caps[1].parse::<usize>().unwrap(), i);
        assert!(pair[1].starts_with('[') && pair[1].ends_with(']'));
    }
    assert_eq!(lines[5], format!("{:?}", outcome.best.sorted()));
}
