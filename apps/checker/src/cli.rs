//! Command-line flags.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::AppError;
use crate::monitoring::gate::DEFAULT_CAPACITY;
use crate::monitoring::{DispatchPolicy, FailurePolicy};
use crate::settings::{Settings, default_config_path};

/// Polls HTTP endpoints and warns when they answer with an unexpected status code
#[derive(Parser, Debug)]
#[command(name = "webstatus")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the target list [default: config.csv next to the executable]
    #[arg(short = 't', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append warnings to this file instead of standard output
    #[arg(short = 'o', value_name = "PATH", default_value = "")]
    pub output: String,

    /// Monitoring time in seconds; 0 runs until killed
    #[arg(short = 'l', value_name = "SECONDS", default_value_t = 0)]
    pub time_limit: u64,

    /// Maximum number of checks in flight
    #[arg(short = 'n', value_name = "COUNT", default_value_t = NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))]
    pub max_connections: NonZeroUsize,

    /// Per-request timeout in seconds; 0 disables it
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Exit on the first failed request instead of logging it
    #[arg(long)]
    pub fail_fast: bool,

    /// Skip due targets while every slot is busy instead of waiting for one
    #[arg(long)]
    pub defer_when_saturated: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve defaults that depend on the environment
    pub fn into_settings(self) -> Result<Settings, AppError> {
        let config_path = match self.config {
            Some(path) => path,
            None => default_config_path().map_err(AppError::ExecutablePath)?,
        };

        Ok(Settings {
            config_path,
            output_path: (!self.output.is_empty()).then(|| PathBuf::from(self.output)),
            time_limit: self.time_limit,
            max_connections: self.max_connections,
            request_timeout: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
            dispatch: if self.defer_when_saturated {
                DispatchPolicy::Defer
            } else {
                DispatchPolicy::Block
            },
            failure: if self.fail_fast { FailurePolicy::Abort } else { FailurePolicy::Continue },
        })
    }
}
