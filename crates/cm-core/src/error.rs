use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CoreReason {
    /// Static misconfiguration detected while building a plugin.
    #[error("plugin configuration error")]
    Config,
    /// Connect, login, send or quit failed against the alert channel.
    #[error("alert delivery error")]
    Delivery,
    #[error("data format error")]
    DataFormat,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CoreReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Config => 1001,
            Self::Delivery => 1002,
            Self::DataFormat => 1003,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CoreError = StructError<CoreReason>;
pub type CoreResult<T> = Result<T, CoreError>;
