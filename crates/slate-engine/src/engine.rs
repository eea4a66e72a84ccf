use std::sync::Arc;

use tracing::info;

use slate_db::Database;
use slate_types::models::{MediaInteraction, Placement};
use slate_types::status::{LifecycleEvent, PostStatus};

use crate::EngineError;
use crate::transition::next_status;

/// Validates and applies status transitions on placements, and records
/// interactions against posted placements.
///
/// The persisted status is updated with an optimistic guard (`WHERE status =
/// from`), so two concurrent attempts at the same transition cannot both
/// succeed and a failed validation never leaves a partial write behind.
#[derive(Clone)]
pub struct LifecycleEngine {
    db: Arc<Database>,
}

impl LifecycleEngine {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Apply `event` to one placement.
    ///
    /// Validation happens against the freshly loaded row; the write only
    /// lands if the row is still in that state. A lost race surfaces as
    /// `Conflict` rather than a silent double transition.
    pub fn advance(&self, placement_id: i64, event: LifecycleEvent) -> Result<Placement, EngineError> {
        let placement = self
            .db
            .get_placement(placement_id)?
            .ok_or(EngineError::PlacementNotFound(placement_id))?;

        let from = placement.status;
        let to = next_status(from, event).ok_or(EngineError::InvalidTransition { from, event })?;

        // Submission attempts are the bounded quantity for retry policy.
        let bump_attempt = matches!(event, LifecycleEvent::Submit | LifecycleEvent::Retry);

        let changed = self
            .db
            .update_placement_status(placement_id, from, to, bump_attempt)?;
        if !changed {
            return Err(EngineError::Conflict(placement_id));
        }

        info!("Placement {}: {} -> {} ({})", placement_id, from, to, event);

        self.db
            .get_placement(placement_id)?
            .ok_or(EngineError::PlacementNotFound(placement_id))
    }

    /// Record a reaction against a placement. Only `POSTED` placements accept
    /// interactions; the record is append-only.
    pub fn record_interaction(
        &self,
        placement_id: i64,
        interaction_type_id: i64,
    ) -> Result<MediaInteraction, EngineError> {
        let placement = self
            .db
            .get_placement(placement_id)?
            .ok_or(EngineError::PlacementNotFound(placement_id))?;

        if self.db.get_interaction_type(interaction_type_id)?.is_none() {
            return Err(EngineError::InteractionTypeNotFound(interaction_type_id));
        }

        if placement.status != PostStatus::Posted {
            return Err(EngineError::NotPosted(placement_id));
        }

        Ok(self.db.insert_interaction(placement_id, interaction_type_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn engine_with_placement() -> (LifecycleEngine, i64) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let user = db
            .create_user("ana", "hash", "ana@example.com", false)
            .unwrap()
            .unwrap();
        let media = db.create_media("/uploads/cat.png", Some("cat"), user.id, 1).unwrap();
        let platform = db.create_platform("pixelgram").unwrap();
        let placement = db
            .schedule_placement(media.id, platform.id, Utc::now())
            .unwrap()
            .unwrap();
        (LifecycleEngine::new(db), placement.id)
    }

    #[test]
    fn happy_path_to_posted() {
        let (engine, id) = engine_with_placement();

        let p = engine.advance(id, LifecycleEvent::Submit).unwrap();
        assert_eq!(p.status, PostStatus::Submitted);
        assert_eq!(p.attempts, 1);

        let p = engine.advance(id, LifecycleEvent::Acknowledge).unwrap();
        assert_eq!(p.status, PostStatus::Pending);

        let p = engine.advance(id, LifecycleEvent::Confirm).unwrap();
        assert_eq!(p.status, PostStatus::Posted);

        // POSTED is terminal.
        let err = engine.advance(id, LifecycleEvent::Reject).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        let stored = engine.db().get_placement(id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Posted);
    }

    #[test]
    fn invalid_event_leaves_status_untouched() {
        let (engine, id) = engine_with_placement();

        let err = engine.advance(id, LifecycleEvent::Confirm).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: PostStatus::Scheduled,
                event: LifecycleEvent::Confirm,
            }
        ));

        let stored = engine.db().get_placement(id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Scheduled);
        assert_eq!(stored.attempts, 0);
    }

    #[test]
    fn failed_submission_can_retry() {
        let (engine, id) = engine_with_placement();

        engine.advance(id, LifecycleEvent::Submit).unwrap();
        engine.advance(id, LifecycleEvent::Fail).unwrap();

        let p = engine.advance(id, LifecycleEvent::Retry).unwrap();
        assert_eq!(p.status, PostStatus::Submitted);
        assert_eq!(p.attempts, 2);
    }

    #[test]
    fn unknown_placement_is_not_found() {
        let (engine, _) = engine_with_placement();
        let err = engine.advance(9999, LifecycleEvent::Submit).unwrap_err();
        assert!(matches!(err, EngineError::PlacementNotFound(9999)));
    }

    #[test]
    fn interaction_requires_posted() {
        let (engine, id) = engine_with_placement();

        let err = engine.record_interaction(id, 1).unwrap_err();
        assert!(matches!(err, EngineError::NotPosted(_)));
        assert!(engine.db().list_interactions(id).unwrap().is_empty());

        engine.advance(id, LifecycleEvent::Submit).unwrap();
        engine.advance(id, LifecycleEvent::Acknowledge).unwrap();
        engine.advance(id, LifecycleEvent::Confirm).unwrap();

        let interaction = engine.record_interaction(id, 1).unwrap();
        assert_eq!(interaction.placement_id, id);

        let listed = engine.db().list_interactions(id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, interaction.id);
    }

    #[test]
    fn interaction_with_unknown_type_is_not_found() {
        let (engine, id) = engine_with_placement();
        engine.advance(id, LifecycleEvent::Submit).unwrap();
        engine.advance(id, LifecycleEvent::Acknowledge).unwrap();
        engine.advance(id, LifecycleEvent::Confirm).unwrap();

        let err = engine.record_interaction(id, 404).unwrap_err();
        assert!(matches!(err, EngineError::InteractionTypeNotFound(404)));
    }
}
