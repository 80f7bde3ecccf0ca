use thiserror::Error;

/// Errors raised while constructing a [`ResourceKey`](crate::ResourceKey).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Bag pages are numbered from 1.
    #[error("page number must be at least 1")]
    ZeroPage,
}
