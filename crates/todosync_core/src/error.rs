use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    #[error("io_error - {0}")]
    Io(String),
    #[error("config_error - {0}")]
    Config(String),
    #[error("store_error - {0}")]
    Store(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config(message.into())
    }

    pub fn store<M: Into<String>>(message: M) -> Self {
        Self::Store(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
            Self::Config(_) => "config_error",
            Self::Store(_) => "store_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Io(message)
            | Self::Config(message)
            | Self::Store(message) => message,
        }
    }

    /// Configuration errors abort startup; everything else is reported and survived.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
