use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid Zeebe spec: {0}")]
    Validation(#[from] ValidationError),

    #[error("Owner registration error: {0}")]
    Registration(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Reconciliation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, OperatorError>;

impl OperatorError {
    /// Whether the pass should be retried with backoff. Non-retryable errors
    /// wait for the next change to the Zeebe resource instead.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OperatorError::Kube(_) | OperatorError::Store(_) | OperatorError::Cancelled
        )
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            OperatorError::Kube(_) => "kube",
            OperatorError::Serialization(_) => "serialization",
            OperatorError::Validation(_) => "validation",
            OperatorError::Registration(_) => "registration",
            OperatorError::Store(_) => "store",
            OperatorError::Cancelled => "cancelled",
        }
    }
}

/// A required field of the Zeebe spec is missing or out of range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field `{0}` is missing")]
    Missing(&'static str),

    #[error("field `{field}` must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("field `{field}` must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("field `{0}` must not be empty")]
    Empty(&'static str),

    #[error("environment variable `{0}` is overridden more than once")]
    DuplicateEnv(String),

    #[error("environment variable `{0}` sets both `value` and `valueFrom`")]
    ConflictingEnvSource(String),
}

impl ValidationError {
    /// Field path the error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Missing(field)
            | ValidationError::Empty(field)
            | ValidationError::NotPositive { field, .. }
            | ValidationError::TooLarge { field, .. } => field,
            ValidationError::DuplicateEnv(_) | ValidationError::ConflictingEnvSource(_) => {
                "broker.backend.overrideEnv"
            }
        }
    }
}
