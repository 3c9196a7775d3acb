use thiserror::Error;

/// Errors raised while decoding or measuring a radiograph.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    EmptyImage,
    #[error("measurement `{0}` produced a non-finite value")]
    NonFinite(&'static str),
}
