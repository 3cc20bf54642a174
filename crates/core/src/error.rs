use thiserror::Error;

/// Query error codes understood by signon clients (the `QueryErrorCode` key).
pub const QUERY_ERROR_GENERAL: i64 = 1;
pub const QUERY_ERROR_BAD_PARAMETERS: i64 = 3;
pub const QUERY_ERROR_CANCELED: i64 = 4;
pub const QUERY_ERROR_BAD_URL: i64 = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("canceled by user")]
    UserCanceled,

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("surface error: {0}")]
    Surface(String),
}

impl NegotiationError {
    /// Code reported to the caller in the error descriptor
    pub fn code(&self) -> i64 {
        match self {
            NegotiationError::InvalidRequest(_) => QUERY_ERROR_BAD_PARAMETERS,
            NegotiationError::UserCanceled => QUERY_ERROR_CANCELED,
            NegotiationError::Navigation(_) => QUERY_ERROR_BAD_URL,
            NegotiationError::Surface(_) => QUERY_ERROR_GENERAL,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, NegotiationError::UserCanceled)
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        NegotiationError::InvalidRequest(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(NegotiationError::UserCanceled.code(), 4);
        assert_eq!(NegotiationError::invalid("x").code(), 3);
        assert_eq!(NegotiationError::Navigation("down".into()).code(), 6);
        assert_eq!(NegotiationError::Surface("gone".into()).code(), 1);
        assert!(NegotiationError::UserCanceled.is_canceled());
    }
}
