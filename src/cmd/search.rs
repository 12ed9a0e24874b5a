use crate::reports;
use basisga::api::Session;
use basisga::config::Config;
use basisga::error::BgResult;
use basisga::optimizer::{Tee, TracingSink, WriterSink};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Ensemble CSV (`replica,flavor,x,value`).
    pub ensemble: PathBuf,

    /// Number of basis vectors.
    pub nrep: usize,

    #[command(flatten)]
    pub config: Config,

    /// Starting basis, defaults to 1..=nrep.
    #[arg(long, value_delimiter = ',')]
    pub initial: Option<Vec<usize>>,

    /// Log progress every N iterations.
    #[arg(long, default_value_t = 100)]
    pub report_every: usize,
}

pub fn run(args: &SearchArgs, session: &Session, output_dir: &Path) -> BgResult<()> {
    info!(
        "- GA Basis selector for Monte Carlo 2 Hessian conversion at {} GeV",
        session.config.ensemble.q
    );

    let initial = match &args.initial {
        Some(ids) => session.basis(ids.clone())?,
        None => session.natural_basis(args.nrep)?,
    };
    if initial.len() != args.nrep {
        return Err(basisga::error::BasisError::Config(format!(
            "--initial lists {} replicas but nrep is {}",
            initial.len(),
            args.nrep
        )));
    }

    let (log_file, log_path) = reports::open_log(output_dir, &session.name, args.nrep)?;
    info!("- Fitting, output redirected to log file {}", log_path.display());

    let mut sink = Tee(
        WriterSink::new(log_file),
        TracingSink {
            every: args.report_every,
        },
    );
    let (outcome, record) = session.search(initial, &mut sink)?;

    let path = reports::write_result(output_dir, &record)?;
    info!("Writing results file {}", path.display());

    println!("\n=== 🏆 FINAL RESULT ===");
    println!("Final ERF: {}", record.final_erf);
    println!("Basis: {:?}", record.basis);
    reports::print_search_report(&record, &outcome);
    reports::print_basis_grid("BEST", &record.basis);
    Ok(())
}
