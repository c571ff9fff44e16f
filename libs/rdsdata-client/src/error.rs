use rdsdata_api::{MappingError, SingleValueError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Malformed call construction: empty SQL, placeholder count mismatch,
    /// mixing object and named parameters.
    #[error("{0}")]
    Argument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    SingleValue(#[from] SingleValueError),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

impl ClientError {
    pub fn argument(msg: impl Into<String>) -> Self {
        ClientError::Argument(msg.into())
    }
}

/// Failure reported by the data service transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    /// Service error code, when the transport has one.
    pub code: Option<String>,
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}
