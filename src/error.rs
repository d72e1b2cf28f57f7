//! Error types of the rendering pipeline.

use singultus_core::DomError;
use thiserror::Error;

/// Failure while materializing nodes or applying patches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The host rejected a DOM operation.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// A child operation referred to an index the parent does not have.
    #[error("no child at index {index}")]
    MissingChild {
        /// The old-side index that could not be resolved.
        index: usize,
    },
    /// A node that should have a parent was detached.
    #[error("node {0} is not attached to a parent")]
    Detached(String),
    /// A patch targets the container's root node, but the container is empty.
    #[error("container {0} has no root node to patch")]
    MissingRoot(String),
    /// The child operations do not describe the final child list.
    #[error("child operations do not line up with the children of {0}")]
    Misaligned(String),
}

/// Failure reported by [`Renderer::try_render`](crate::Renderer::try_render).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Mounting a fresh tree failed.
    #[error("failed to mount: {0}")]
    Mount(#[source] PatchError),
    /// Applying patches failed and the fallback re-render is disabled.
    #[error("failed to patch: {0}")]
    Patch(#[source] PatchError),
    /// Applying patches failed and so did the full re-render.
    #[error("failed to patch ({patch}) and the full re-render failed as well ({fallback})")]
    FallbackFailed {
        /// The original patch failure.
        patch: PatchError,
        /// The failure of the fallback mount.
        #[source]
        fallback: PatchError,
    },
}
