pub mod dispatch;
pub mod engine;
pub mod transition;

pub use engine::LifecycleEngine;

use slate_types::status::{LifecycleEvent, PostStatus};
use thiserror::Error;

/// Everything that can go wrong while driving a placement's lifecycle.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("placement {0} not found")]
    PlacementNotFound(i64),

    #[error("interaction type {0} not found")]
    InteractionTypeNotFound(i64),

    #[error("placement in status '{from}' does not accept event '{event}'")]
    InvalidTransition {
        from: PostStatus,
        event: LifecycleEvent,
    },

    #[error("placement {0} is not posted; interactions require a posted placement")]
    NotPosted(i64),

    #[error("placement {0} was modified concurrently; re-read and retry")]
    Conflict(i64),

    #[error(transparent)]
    Db(#[from] anyhow::Error),
}
