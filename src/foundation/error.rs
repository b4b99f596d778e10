pub type VidsumResult<T> = Result<T, VidsumError>;

#[derive(thiserror::Error, Debug)]
pub enum VidsumError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot open media: {0}")]
    CannotOpen(String),

    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),

    #[error("encode failure: {0}")]
    EncodeFailure(String),

    #[error("annotation error: {0}")]
    Annotation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VidsumError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn cannot_open(msg: impl Into<String>) -> Self {
        Self::CannotOpen(msg.into())
    }

    pub fn frame_unavailable(msg: impl Into<String>) -> Self {
        Self::FrameUnavailable(msg.into())
    }

    pub fn encode_failure(msg: impl Into<String>) -> Self {
        Self::EncodeFailure(msg.into())
    }

    pub fn annotation(msg: impl Into<String>) -> Self {
        Self::Annotation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Subject-level failures are recovered by skipping the subject; everything else is
    /// terminal for the request.
    pub fn is_subject_level(&self) -> bool {
        matches!(self, Self::FrameUnavailable(_))
    }
}
