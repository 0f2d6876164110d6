use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlyerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Service {
        status: Option<u16>,
        message: String,
    },

    #[error("Quota error: {0}")]
    Quota(String),

    #[error("Response error: {0}")]
    Response(String),

    #[error("Task {task_id} still pending after {attempts} status checks")]
    PollTimeout { task_id: String, attempts: u32 },

    #[error("A {0} request is already in progress")]
    Busy(&'static str),

    #[error("Action not allowed: {0}")]
    NotAllowed(String),

    #[error("Session was torn down before the request completed")]
    Cancelled,
}

impl FlyerError {
    pub fn service(message: impl Into<String>) -> Self {
        FlyerError::Service {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            FlyerError::Service { .. }
                | FlyerError::Quota(_)
                | FlyerError::Response(_)
                | FlyerError::PollTimeout { .. }
        )
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, FlyerError::Quota(_))
    }
}

pub type Result<T> = std::result::Result<T, FlyerError>;
