use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, fmt, path};

use crate::monitoring::{DispatchPolicy, FailurePolicy};

/// File name looked up next to the executable when no config path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.csv";

/// Effective runtime configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    /// `None` writes warnings to stdout
    pub output_path: Option<PathBuf>,
    /// Seconds to keep dispatching; `0` runs until killed
    pub time_limit: u64,
    pub max_connections: NonZeroUsize,
    /// `None` lets requests run without a timeout
    pub request_timeout: Option<Duration>,
    pub dispatch: DispatchPolicy,
    pub failure: FailurePolicy,
}

/// `config.csv` in the directory holding the running executable
pub fn default_config_path() -> std::io::Result<path::PathBuf> {
    let exe = env::current_exe()?;
    let dir = exe.parent().map(path::Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(DEFAULT_CONFIG_FILE))
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        let output = self
            .output_path
            .as_ref()
            .map_or_else(|| "stdout".to_string(), |path| path.display().to_string());
        let limit = match self.time_limit {
            0 => "unlimited".to_string(),
            seconds => format!("{seconds}s"),
        };
        let timeout = self
            .request_timeout
            .map_or_else(|| "none".to_string(), |timeout| format!("{}s", timeout.as_secs()));

        writeln!(f, "Current Configuration State:")?;
        write_title_1(f, "Targets")?;
        write_1(f, "Config Path", &self.config_path.display())?;
        write_title_1(f, "Output")?;
        write_1(f, "Destination", &output)?;
        write_title_1(f, "Scheduling")?;
        write_1(f, "Time Limit", &limit)?;
        write_1(f, "Max Connections", &self.max_connections)?;
        write_1(f, "Dispatch Policy", &format!("{:?}", self.dispatch))?;
        write_title_1(f, "Requests")?;
        write_1(f, "Timeout", &timeout)?;
        write_1(f, "Failure Policy", &format!("{:?}", self.failure))?;

        Ok(())
    }
}
