use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("running average window must cover at least 2 frames, got {0}")]
    WindowTooSmall(usize),
    #[error("max distance threshold must be positive, got {0}")]
    NonPositiveDistanceThreshold(f32),
    #[error("minimum blob size must be at least 1 pixel")]
    ZeroBlobSize,
}
