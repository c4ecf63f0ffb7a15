use clap::Parser;
use cyber_incident_classifier::{config::Config, IncidentPipeline};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cyber-incident-classifier")]
#[command(about = "Generate and classify synthetic cyber incidents", version, long_about = None)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "CYBER_INCIDENTS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the export destination
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        config.export.output_path = output;
    }

    init_tracing(&config);
    tracing::info!(
        "Starting cyber incident classifier v{}",
        env!("CARGO_PKG_VERSION")
    );

    let report = IncidentPipeline::new(config).run().map_err(|e| {
        tracing::error!(error_code = e.error_code(), error = %e, "Pipeline failed");
        e
    })?;

    println!(
        "{} generated with classified incidents.",
        report.output_path.display()
    );
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "cyber_incident_classifier={}",
            config.observability.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
