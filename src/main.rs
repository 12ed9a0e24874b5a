use basisga::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about = "GA basis selector for Monte Carlo to Hessian conversion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory receiving the .log and .json result files.
    #[arg(global = true, short, long, default_value = ".")]
    output_dir: PathBuf,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Search(cmd::search::SearchArgs),
    Evaluate(cmd::evaluate::EvaluateArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    } else {
        tracing_subscriber::fmt::init();
    }

    info!("🚀 basisga v{}", env!("CARGO_PKG_VERSION"));

    let (ensemble_path, config): (&PathBuf, Config) = match &cli.command {
        Commands::Search(args) => (&args.ensemble, args.config.clone()),
        Commands::Evaluate(args) => (&args.ensemble, args.config()),
    };

    let session = match basisga::api::Session::load(ensemble_path, config) {
        Ok(s) => s,
        Err(e) => {
            error!("❌ FATAL ERROR LOADING ENSEMBLE: {}", e);
            process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Search(args) => cmd::search::run(args, &session, &cli.output_dir),
        Commands::Evaluate(args) => cmd::evaluate::run(args, &session),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
