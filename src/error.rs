// Error types for the BIRD route sync daemon

use thiserror::Error;

/// Failure of a `birdc` invocation
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send directive to {command}: {source}")]
    Stdin {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with status {exit_code}: {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },
}

/// Failure talking to the shared key-value store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store command error: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Routing daemon error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Adapter(AdapterError::Spawn { command, .. }) => {
                format!("Failed to execute {}. Make sure BIRD is installed and on PATH.", command)
            }
            AppError::Adapter(_) => {
                "BIRD rejected the command. Check the daemon log and control socket permissions."
                    .to_string()
            }
            AppError::Store(_) => {
                "Shared store unavailable. Check the Redis host, port and database settings."
                    .to_string()
            }
            AppError::Config(_) => {
                "Configuration error. Check your config file or command-line arguments.".to_string()
            }
            AppError::Serialization(_) => {
                "Data format error. This might be a bug, please report it.".to_string()
            }
        }
    }

    /// Store failures terminate the process; daemon failures only abort the current operation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::Adapter(_))
    }
}
