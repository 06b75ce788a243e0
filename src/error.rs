use thiserror::Error;

/// Failures that reach the user. Every variant is handled at the boundary
/// nearest its origin and shown as an alert or status message; none abort
/// the editing session.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("cannot decode image data: {0}")]
    DecodeFailure(String),

    #[error("cannot obtain a render target for the output buffer")]
    RenderContextUnavailable,

    #[error("clipboard is not available on this system")]
    ClipboardUnsupported,

    #[error("cannot write image to clipboard: {0}")]
    ClipboardWriteFailure(String),

    #[error("both frames need an image before merging")]
    MissingCounterpart,
}

impl From<image::ImageError> for EditorError {
    fn from(err: image::ImageError) -> Self {
        Self::DecodeFailure(err.to_string())
    }
}
