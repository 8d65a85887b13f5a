use churn_sentinel::config::Config;
use churn_sentinel::logging::init_tracing;
use churn_sentinel::metrics::{init_metrics, write_textfile};
use churn_sentinel::monitoring::{RetrainOrchestrator, RunOutcome};
use churn_sentinel::training::{retrain_with_guard, train, GuardOutcome};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "churn-sentinel-cli")]
#[command(about = "Churn model training, drift monitoring and scoring CLI", long_about = None)]
struct Cli {
    /// Configuration file (defaults are embedded)
    #[arg(short, long, env = "CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    /// Base URL of a running scoring service
    #[arg(short, long, default_value = "http://localhost:8000", global = true)]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on the configured dataset and deploy the result unconditionally
    Train,

    /// Retrain and deploy only if the quality guard accepts the candidate
    Retrain,

    /// Evaluate drift on the inference log and retrain when warranted
    #[command(name = "drift-check")]
    DriftCheck,

    /// Score one customer against a running service
    Predict {
        /// Feature mapping as a JSON object
        #[arg(value_name = "FEATURES_JSON")]
        features: String,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::load_from(cli.config.as_deref())?;
    init_tracing(&config.observability);
    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Failed to initialize metrics");
    }

    match cli.command {
        Commands::Train => {
            let run = train(&config)?;
            println!(
                "Model trained: roc_auc={:.4} accuracy={:.4}",
                run.metrics.roc_auc, run.metrics.accuracy
            );
            println!("Run record: {}", run.run_record.display());
        }

        Commands::Retrain => match export_after(&config, retrain_with_guard(&config))? {
            GuardOutcome::Accepted { candidate, previous } => {
                println!(
                    "New model accepted: roc_auc={:.4} (previous: {})",
                    candidate.roc_auc,
                    previous.map_or("none".to_string(), |m| format!("{:.4}", m.roc_auc))
                );
            }
            GuardOutcome::Rejected { candidate, previous } => {
                println!(
                    "New model rejected: roc_auc={:.4} (deployed: {})",
                    candidate.roc_auc,
                    previous.map_or("none".to_string(), |m| format!("{:.4}", m.roc_auc))
                );
            }
        },

        Commands::DriftCheck => {
            let orchestrator = RetrainOrchestrator::from_config(&config, cli.config.as_deref())?;
            let outcome = export_after(&config, orchestrator.run())?;
            match &outcome {
                RunOutcome::NoData(reason) => println!("No data for drift check: {}", reason),
                RunOutcome::DriftMetricMissing { .. } => {
                    println!("Drift report has no dataset drift metric, retraining not decided")
                }
                RunOutcome::NoDrift { share, .. } => {
                    println!("No retraining needed (drift share {:.2})", share)
                }
                RunOutcome::BlockedByCooldown { share, .. } => {
                    println!("Drift detected ({:.2}) but retraining blocked by cooldown", share)
                }
                RunOutcome::Retrained { share, .. } => {
                    println!("Drift detected ({:.2}), model retrained", share)
                }
            }
            if let Some(report) = outcome.report() {
                println!("Drift report: {}", report.html_path.display());
            }
        }

        Commands::Predict { features } => {
            let features: serde_json::Value = serde_json::from_str(&features)?;
            let response = Client::new()
                .post(format!("{}/predict", cli.endpoint))
                .json(&json!({ "features": features }))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Health => {
            let response = Client::new()
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

/// Export batch metrics once the run finished, whatever its result
fn export_after<T>(config: &Config, result: T) -> T {
    let path = config.paths.metrics_textfile_path();
    match write_textfile(&path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Metrics exported"),
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to export metrics"),
    }
    result
}
