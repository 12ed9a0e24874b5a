use crate::reports;
use basisga::api::Session;
use basisga::config::{Config, EnsembleParams, SearchParams};
use basisga::error::BgResult;
use basisga::scorer::CandidateScore;
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Ensemble CSV (`replica,flavor,x,value`).
    pub ensemble: PathBuf,

    /// Comma separated replica ids, e.g. `3,17,42`.
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub basis: Vec<usize>,

    #[command(flatten)]
    pub ensemble_params: EnsembleParams,

    #[arg(long)]
    pub threads: Option<usize>,
}

impl EvaluateArgs {
    pub fn config(&self) -> Config {
        Config {
            ensemble: self.ensemble_params.clone(),
            search: SearchParams {
                threads: self.threads,
                ..Default::default()
            },
        }
    }
}

pub fn run(args: &EvaluateArgs, session: &Session) -> BgResult<()> {
    let basis = session.basis(args.basis.clone())?;

    match session.evaluate(&basis)? {
        CandidateScore::Scored(details) => {
            println!("ERF: {}", details.erf);
            reports::print_evaluation_report(&session.name, &basis.sorted(), &details);
        }
        CandidateScore::Degenerate(reason) => {
            warn!("{}", reason);
            println!("ERF: degenerate");
            println!(" [Error] Too redundant basis, try to reduce the size of the basis.");
        }
    }
    Ok(())
}
