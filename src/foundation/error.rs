/// Convenience result type used across vidcollage.
pub type CollageResult<T> = Result<T, CollageError>;

/// Top-level error taxonomy.
///
/// Every variant is fatal for a run; the binary maps all of them to exit code 1.
#[derive(thiserror::Error, Debug)]
pub enum CollageError {
    /// Bad or missing command-line usage (no tiles, unknown flags).
    #[error("usage error: {0}")]
    Usage(String),

    /// A tile spec token that does not follow `path@WxH+X+Y`.
    #[error("malformed tile spec: {0}")]
    MalformedSpec(String),

    /// Codec identifier that is not a 4-character FOURCC.
    #[error("invalid codec: {0}")]
    InvalidCodec(String),

    /// Output frame rate below 1.
    #[error("invalid fps: {0}")]
    InvalidFps(String),

    /// The output encoder could not be opened.
    #[error("failed to open video writer: {0}")]
    WriterOpen(String),

    /// An input source could not be opened, probed or read.
    #[error("source error: {0}")]
    Source(String),

    /// The output encoder failed after it was opened.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollageError {
    /// Build a [`CollageError::Usage`] value.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Build a [`CollageError::MalformedSpec`] value.
    pub fn malformed_spec(msg: impl Into<String>) -> Self {
        Self::MalformedSpec(msg.into())
    }

    /// Build a [`CollageError::InvalidCodec`] value.
    pub fn invalid_codec(msg: impl Into<String>) -> Self {
        Self::InvalidCodec(msg.into())
    }

    /// Build a [`CollageError::InvalidFps`] value.
    pub fn invalid_fps(msg: impl Into<String>) -> Self {
        Self::InvalidFps(msg.into())
    }

    /// Build a [`CollageError::WriterOpen`] value.
    pub fn writer_open(msg: impl Into<String>) -> Self {
        Self::WriterOpen(msg.into())
    }

    /// Build a [`CollageError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`CollageError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Whether the binary should follow the diagnostic with usage text.
    pub fn wants_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::MalformedSpec(_))
    }
}
