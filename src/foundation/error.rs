pub type CuelineResult<T> = Result<T, CuelineError>;

#[derive(thiserror::Error, Debug)]
pub enum CuelineError {
    #[error("reference error: {0}")]
    Reference(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("compose error: {0}")]
    Compose(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CuelineError {
    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn compose(msg: impl Into<String>) -> Self {
        Self::Compose(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
