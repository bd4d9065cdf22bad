use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use loadviz_core::config::{ReportConfig, DEFAULT_METRICS_FILE};
use loadviz_core::pipeline;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Turn a k6 metrics summary into a baseline comparison report.
#[derive(Parser, Debug)]
#[command(name = "loadviz", version, about)]
struct Cli {
    /// Metrics summary CSV exported by the k6 run
    #[arg(default_value = DEFAULT_METRICS_FILE)]
    metrics_file: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadviz=info,loadviz_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ReportConfig::builder().metrics_path(cli.metrics_file).build();

    match pipeline::run(&config).await {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_input_error() => {
            eprintln!("{e}");
            eprintln!("Run the k6 load test first to produce the metrics summary.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "report generation failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
