use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tzshapefilegen::{Config, ConsoleSink, Generator, Result, ToExitCode};

/// Environment variable naming an optional JSON configuration file
const CONFIG_ENV: &str = "TZSHAPEFILEGEN_CONFIG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Generate a Go source file embedding the simplified timezone shapes",
    long_about = None
)]
struct Cli {
    /// timezone-boundary-builder release to download [default: 2018g]
    #[arg(long)]
    release: Option<String>,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(stage = %e.stage(), code = e.error_code(), "{e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            info!(?path, "loading configuration");
            Config::from_json_file(&path)?
        }
        None => Config::default(),
    };
    if let Some(release) = cli.release {
        config.download.release = release;
    }

    let generator = Generator::new(config)?;
    let release = generator.config().download.release.clone();

    let cancel_token = CancellationToken::new();
    let watcher = tzshapefilegen::cancel_on_signal(cancel_token.clone());

    let result = generator
        .run(Box::new(ConsoleSink::stdout(&release)), &cancel_token)
        .await;
    watcher.abort();
    let report = result?;

    info!(
        release = %report.release,
        downloaded_bytes = report.downloaded_bytes,
        simplified_bytes = report.simplified_bytes,
        compressed_bytes = report.compressed_bytes,
        "generation complete"
    );
    println!("Wrote {}", report.output_path.display());
    Ok(())
}
