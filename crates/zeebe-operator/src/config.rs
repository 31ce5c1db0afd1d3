use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::constants::defaults;

#[derive(Parser, Debug)]
#[command(
    name = "zeebe-operator",
    about = "Kubernetes operator for Zeebe clusters",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: OperatorConfig,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the controller (default)
    Run,

    /// Print the Zeebe CRD as YAML and exit
    Crd,
}

/// Runtime settings of the operator.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct OperatorConfig {
    /// Namespace to watch; all namespaces when unset
    #[arg(long, env = "ZEEBE_OPERATOR_NAMESPACE")]
    pub namespace: Option<String>,

    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, env = "ZEEBE_OPERATOR_LOG_LEVEL", default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    /// Bind address of the metrics and health endpoint
    #[arg(long, env = "ZEEBE_OPERATOR_METRICS_ADDR", default_value = defaults::METRICS_ADDR)]
    pub metrics_addr: String,

    /// Seconds between passes of a healthy cluster
    #[arg(long, env = "ZEEBE_OPERATOR_REQUEUE_SECS", default_value_t = defaults::REQUEUE_SECS)]
    pub requeue_secs: u64,

    /// Seconds before retrying a failed pass
    #[arg(
        long,
        env = "ZEEBE_OPERATOR_ERROR_REQUEUE_SECS",
        default_value_t = defaults::ERROR_REQUEUE_SECS
    )]
    pub error_requeue_secs: u64,

    /// Maximum passes running at once
    #[arg(long, env = "ZEEBE_OPERATOR_CONCURRENCY", default_value_t = defaults::CONCURRENCY)]
    pub concurrency: u16,

    /// Field manager used for server-side apply
    #[arg(long, env = "ZEEBE_OPERATOR_FIELD_MANAGER", default_value = defaults::FIELD_MANAGER)]
    pub field_manager: String,
}

impl OperatorConfig {
    pub fn requeue(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            log_level: defaults::LOG_LEVEL.into(),
            metrics_addr: defaults::METRICS_ADDR.into(),
            requeue_secs: defaults::REQUEUE_SECS,
            error_requeue_secs: defaults::ERROR_REQUEUE_SECS,
            concurrency: defaults::CONCURRENCY,
            field_manager: defaults::FIELD_MANAGER.into(),
        }
    }
}
