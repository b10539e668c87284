use clap::Parser;
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "vitals-edge", about = "Edge gateway for web-vitals telemetry")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), "{e}");
            return ExitCode::FAILURE;
        }
    };

    // Must outlive the server loop so events keep flushing.
    let _sentry_guard = config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.common.metrics {
        match StatsdBuilder::from(&metrics_config.statsd_host, metrics_config.statsd_port)
            .build(Some("vitals_edge"))
        {
            Ok(recorder) => {
                if let Err(e) = metrics::set_global_recorder(recorder) {
                    tracing::error!("could not install statsd recorder: {e}");
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                tracing::error!("could not build statsd recorder: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("could not start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(ingest_gateway::run(config.gateway)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("gateway terminated: {e}");
            ExitCode::FAILURE
        }
    }
}
