use std::io::Error as IoError;

use thiserror::Error;

use crate::config::ConfigError;
use crate::monitoring::CheckError;
use crate::monitoring::gate::GateClosed;
use crate::monitoring::reporter::RequestFailed;
use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Output(#[from] SinkError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] CheckError),
    #[error(transparent)]
    Request(#[from] RequestFailed),
    #[error("failed to locate the running executable: {0:#}")]
    ExecutablePath(IoError),
    #[error(transparent)]
    GateClosed(#[from] GateClosed),
    #[error("reporter task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
