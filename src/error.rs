use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GhSubError {
    #[error("gh CLI not found. Install it and run 'gh auth login' first.")]
    GhNotFound,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("API request failed with status {status}: {message}")]
    ApiStatus {
        status: u16,
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Rate limited by the API")]
    RateLimited { retry_after: Option<u64> },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("GraphQL error: {0}")]
    GraphQLError(String),

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    #[error("Pagination did not terminate after {pages} pages (repeated or runaway cursor)")]
    PaginationLoop { pages: usize },

    #[error("Unknown field '{name}'. Available fields: {available}")]
    UnknownField { name: String, available: String },

    #[error("'{value}' is not a valid option for field '{field}'. Valid options: {options}")]
    UnknownOption {
        field: String,
        value: String,
        options: String,
    },

    #[error("Deadline exceeded before the operation could complete")]
    DeadlineExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type GhSubResult<T> = Result<T, GhSubError>;

impl GhSubError {
    /// Whether a retry without changing the input can be expected to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GhSubError::RateLimited { .. } => true,
            GhSubError::Timeout(_) => true,
            GhSubError::ApiStatus {
                status,
                retry_after,
                ..
            } => match status {
                429 => true,
                // Bare 403 is an auth/permission problem; with a hint it is
                // GitHub's secondary rate limit.
                403 => retry_after.is_some(),
                500..=599 => true,
                _ => false,
            },
            // A reset pipe to the subprocess shows up as an IO error.
            GhSubError::IoError(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// Server-provided wait hint, when the failure carried one.
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            GhSubError::RateLimited { retry_after } => retry_after.map(Duration::from_secs),
            GhSubError::ApiStatus { retry_after, .. } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }
}

pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> GhSubResult<T>;
    fn with_context<F>(self, f: F) -> GhSubResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn context(self, msg: &str) -> GhSubResult<T> {
        self.map_err(|e| GhSubError::Unknown(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> GhSubResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| GhSubError::Unknown(format!("{}: {}", f(), e)))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, msg: &str) -> GhSubResult<T> {
        self.ok_or_else(|| GhSubError::Unknown(msg.to_string()))
    }

    fn with_context<F>(self, f: F) -> GhSubResult<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| GhSubError::Unknown(f()))
    }
}

#[macro_export]
macro_rules! ghsub_error {
    ($error_type:ident, $msg:expr) => {
        GhSubError::$error_type($msg.to_string())
    };
    ($error_type:ident, $fmt:expr, $($arg:tt)*) => {
        GhSubError::$error_type(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_transient() {
        let err = GhSubError::RateLimited {
            retry_after: Some(5),
        };
        assert!(err.is_transient());
        assert_eq!(err.retry_hint(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn bare_403_is_permanent_but_hinted_403_is_transient() {
        let bare = GhSubError::ApiStatus {
            status: 403,
            message: "forbidden".to_string(),
            retry_after: None,
        };
        assert!(!bare.is_transient());

        let hinted = GhSubError::ApiStatus {
            status: 403,
            message: "secondary rate limit".to_string(),
            retry_after: Some(30),
        };
        assert!(hinted.is_transient());
        assert_eq!(hinted.retry_hint(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = GhSubError::ApiStatus {
            status: 502,
            message: "bad gateway".to_string(),
            retry_after: None,
        };
        assert!(err.is_transient());
    }

    #[test]
    fn validation_errors_are_permanent() {
        let err = GhSubError::UnknownField {
            name: "Estimate".to_string(),
            available: "Status, Priority".to_string(),
        };
        assert!(!err.is_transient());
        assert!(err.retry_hint().is_none());
    }

    #[test]
    fn error_context_on_result() {
        let result: Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let wrapped = result.context("Failed to read config file");
        match wrapped {
            Err(GhSubError::Unknown(msg)) => {
                assert!(msg.contains("Failed to read config file"));
                assert!(msg.contains("file not found"));
            }
            _ => panic!("Expected GhSubError::Unknown"),
        }
    }

    #[test]
    fn ghsub_error_macro() {
        let error = ghsub_error!(InvalidInput, "depth must be >= 0, got {}", -2);
        match error {
            GhSubError::InvalidInput(msg) => assert_eq!(msg, "depth must be >= 0, got -2"),
            _ => panic!("Expected GhSubError::InvalidInput"),
        }
    }
}
