use thiserror::Error;

/// Errors reported by fragment operations.
///
/// Every variant except `OutOfMemory` guarantees the fragment was left
/// untouched by the failing call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FragmentError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("channels number mismatch: expected {expected}, found {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("sample rate mismatch: expected {expected}, found {found}")]
    RateMismatch { expected: u32, found: u32 },

    #[error("index {index} out of range for fragment of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("unsupported sample width: {sample_width} bytes")]
    UnsupportedFormat { sample_width: usize },

    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    #[error("invalid buffer length {length}, not a multiple of frame size {frame_size}")]
    InvalidLength { length: usize, frame_size: usize },

    #[error("out of memory while allocating {requested} samples per channel")]
    OutOfMemory { requested: usize },

    #[error("invalid filter configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FragmentError>;

impl From<serde_json::Error> for FragmentError {
    fn from(e: serde_json::Error) -> Self {
        FragmentError::Config(e.to_string())
    }
}
