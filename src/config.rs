use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedded defaults, overridden by an optional file and `CHURN__*` environment variables.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// File locations for data and artifacts
    #[serde(default)]
    pub paths: PathsConfig,

    /// Drift monitoring and retraining trigger configuration
    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Training pipeline configuration
    #[serde(default)]
    pub training: TrainingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from `CONFIG_PATH` (if set) and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("CONFIG_PATH").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load configuration from an explicit file and environment
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));

        // Override with config file if given
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            // Override with environment variables (prefix: CHURN__)
            .add_source(
                config::Environment::with_prefix("CHURN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Labeled dataset used for training and as drift reference
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Directory holding model, metrics, schema and retrain state
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Append-only log written by the serving API
    #[serde(default = "default_inference_log")]
    pub inference_log: PathBuf,

    /// Drift report output directory
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Training run records
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,
}

impl PathsConfig {
    /// Default layout relocated under `root`
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            data_path: root.join(default_data_path()),
            artifacts_dir: root.join(default_artifacts_dir()),
            inference_log: root.join(default_inference_log()),
            reports_dir: root.join(default_reports_dir()),
            runs_dir: root.join(default_runs_dir()),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifacts_dir.join("model.json")
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.artifacts_dir.join("metrics.json")
    }

    pub fn schema_path(&self) -> PathBuf {
        self.artifacts_dir.join("train_schema.json")
    }

    pub fn baseline_stats_path(&self) -> PathBuf {
        self.artifacts_dir.join("baseline_stats.json")
    }

    pub fn retrain_state_path(&self) -> PathBuf {
        self.artifacts_dir.join("retrain_state.json")
    }

    /// Prometheus textfile written by the batch commands
    pub fn metrics_textfile_path(&self) -> PathBuf {
        self.artifacts_dir.join("churn_sentinel.prom")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            artifacts_dir: default_artifacts_dir(),
            inference_log: default_inference_log(),
            reports_dir: default_reports_dir(),
            runs_dir: default_runs_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Share of drifted columns at or above which retraining is warranted
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,

    /// Minimum hours between retraining triggers (0 disables throttling)
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: f64,

    /// Per-column p-value below which a column counts as drifted
    #[serde(default = "default_stattest_threshold")]
    pub stattest_threshold: f64,

    /// Drifted share at which the report flags dataset drift
    #[serde(default = "default_drift_share")]
    pub drift_share: f64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            drift_threshold: default_drift_threshold(),
            cooldown_hours: default_cooldown_hours(),
            stattest_threshold: default_stattest_threshold(),
            drift_share: default_drift_share(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Label column, stripped from the reference dataset
    #[serde(default = "default_target_column")]
    pub target_column: String,

    /// Columns always one-hot encoded
    #[serde(default = "default_categorical_features")]
    pub categorical_features: Vec<String>,

    /// Validation fraction
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Solver iteration cap
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,

    /// Allowed ROC-AUC regression when replacing the deployed model
    #[serde(default = "default_quality_tolerance")]
    pub quality_tolerance: f64,

    /// Experiment name stamped on run records
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,

    /// Retraining command; empty means `<current executable> retrain`
    #[serde(default)]
    pub command: Vec<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target_column: default_target_column(),
            categorical_features: default_categorical_features(),
            test_size: default_test_size(),
            max_iterations: default_max_iterations(),
            quality_tolerance: default_quality_tolerance(),
            experiment_name: default_experiment_name(),
            command: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/raw/churn-bigml-80.csv")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_inference_log() -> PathBuf {
    PathBuf::from("logs/api.log")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports/drift")
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("mlruns")
}

fn default_drift_threshold() -> f64 {
    0.3
}

fn default_cooldown_hours() -> f64 {
    24.0
}

fn default_stattest_threshold() -> f64 {
    0.05
}

fn default_drift_share() -> f64 {
    0.5
}

fn default_target_column() -> String {
    "Churn".to_string()
}

fn default_categorical_features() -> Vec<String> {
    ["State", "International plan", "Voice mail plan", "Area code"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_test_size() -> f64 {
    0.2
}

fn default_max_iterations() -> u64 {
    1000
}

fn default_quality_tolerance() -> f64 {
    0.01
}

fn default_experiment_name() -> String {
    "churn_baseline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
