//! Error types for Phytoscan

/// Result type alias using Phytoscan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Phytoscan operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Label or weight resource missing, unreadable or corrupt
    #[error("resource error: {0}")]
    Resource(String),

    /// Weights do not fit the constructed architecture
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Input bytes are not a decodable image
    #[error("decode error: {0}")]
    Decode(String),

    /// Tensor operation failed during a forward pass
    #[error("inference error: {0}")]
    Inference(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new resource error
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures that happen while bringing a predictor up.
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Resource(_) | Self::ModelLoad(_) | Self::Config(_))
    }
}
