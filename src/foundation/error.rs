/// Convenience result type used across GiftBeat.
pub type GiftbeatResult<T> = Result<T, GiftbeatError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum GiftbeatError {
    /// Rejected user input: unsupported files, empty timelines, unknown ids, bad settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// An asset could not be read or decoded into pixels.
    #[error("decode error: {0}")]
    Decode(String),

    /// The recording pipeline failed; the current export is abandoned.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors while evaluating timeline state or compositing a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing project data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GiftbeatError {
    /// Build a [`GiftbeatError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GiftbeatError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`GiftbeatError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`GiftbeatError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`GiftbeatError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for failures the renderer recovers from with a blank frame.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<serde_json::Error> for GiftbeatError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
