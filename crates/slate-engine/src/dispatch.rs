use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use slate_types::status::LifecycleEvent;

use crate::{EngineError, LifecycleEngine};

/// Knobs for the background dispatch loop. The attempt bound is policy; the
/// engine itself only counts.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub interval: Duration,
    pub submit_timeout: Duration,
    pub max_attempts: i64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            submit_timeout: Duration::from_secs(300),
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub submitted: usize,
    pub timed_out: usize,
    pub retried: usize,
}

impl DispatchSummary {
    fn is_empty(&self) -> bool {
        self.submitted == 0 && self.timed_out == 0 && self.retried == 0
    }
}

/// Background task that drives placements through time-based transitions.
///
/// Runs on an interval and, per pass: submits due SCHEDULED placements,
/// fails SUBMITTED placements whose attempt timed out, and retries FAILED
/// placements still under the attempt budget. Each transition goes through
/// `LifecycleEngine::advance`, so a concurrent worker on the same row makes
/// at most one of them win.
pub async fn run_dispatch_loop(engine: LifecycleEngine, config: DispatchConfig) {
    let mut interval = tokio::time::interval(config.interval);

    loop {
        interval.tick().await;

        match run_once(&engine, &config, Utc::now()) {
            Ok(summary) => {
                if !summary.is_empty() {
                    info!(
                        "Dispatch: {} submitted, {} timed out, {} retried",
                        summary.submitted, summary.timed_out, summary.retried
                    );
                }
            }
            Err(e) => {
                warn!("Dispatch pass failed: {}", e);
            }
        }
    }
}

/// One dispatch pass. `now` is a parameter so tests can steer the clock.
pub fn run_once(
    engine: &LifecycleEngine,
    config: &DispatchConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<DispatchSummary> {
    let mut summary = DispatchSummary::default();

    for placement in engine.db().due_placements(now)? {
        if advance_quietly(engine, placement.id, LifecycleEvent::Submit) {
            summary.submitted += 1;
        }
    }

    let cutoff = now
        - chrono::Duration::from_std(config.submit_timeout)
            .unwrap_or_else(|_| chrono::Duration::seconds(300));
    for placement in engine.db().stale_submissions(cutoff)? {
        if advance_quietly(engine, placement.id, LifecycleEvent::Fail) {
            summary.timed_out += 1;
        }
    }

    for placement in engine.db().retryable_placements(config.max_attempts)? {
        if advance_quietly(engine, placement.id, LifecycleEvent::Retry) {
            summary.retried += 1;
        }
    }

    Ok(summary)
}

/// Losing a race or a stale read between the list query and the advance is
/// expected under concurrent workers; only real failures get logged loudly.
fn advance_quietly(engine: &LifecycleEngine, placement_id: i64, event: LifecycleEvent) -> bool {
    match engine.advance(placement_id, event) {
        Ok(_) => true,
        Err(EngineError::Conflict(_) | EngineError::InvalidTransition { .. }) => {
            debug!("Placement {}: {} skipped, state moved underneath", placement_id, event);
            false
        }
        Err(e) => {
            warn!("Placement {}: {} failed: {}", placement_id, event, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use slate_db::Database;
    use slate_types::status::PostStatus;
    use std::sync::Arc;

    fn engine_with_placement(scheduled_at: DateTime<Utc>) -> (LifecycleEngine, i64) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let user = db
            .create_user("ana", "hash", "ana@example.com", false)
            .unwrap()
            .unwrap();
        let media = db.create_media("/uploads/cat.png", None, user.id, 1).unwrap();
        let platform = db.create_platform("pixelgram").unwrap();
        let placement = db
            .schedule_placement(media.id, platform.id, scheduled_at)
            .unwrap()
            .unwrap();
        (LifecycleEngine::new(db), placement.id)
    }

    #[test]
    fn due_placement_is_submitted() {
        let now = Utc::now();
        let (engine, id) = engine_with_placement(now - ChronoDuration::minutes(1));

        let summary = run_once(&engine, &DispatchConfig::default(), now).unwrap();
        assert_eq!(summary.submitted, 1);

        let stored = engine.db().get_placement(id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Submitted);
        assert_eq!(stored.attempts, 1);
    }

    #[test]
    fn future_placement_is_left_alone() {
        let now = Utc::now();
        let (engine, id) = engine_with_placement(now + ChronoDuration::hours(1));

        let summary = run_once(&engine, &DispatchConfig::default(), now).unwrap();
        assert_eq!(summary, DispatchSummary::default());

        let stored = engine.db().get_placement(id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Scheduled);
    }

    #[test]
    fn stale_submission_times_out_and_retries() {
        let now = Utc::now();
        let (engine, id) = engine_with_placement(now - ChronoDuration::minutes(1));
        engine.advance(id, LifecycleEvent::Submit).unwrap();

        let config = DispatchConfig::default();

        // Pretend the submission has been sitting for longer than the timeout:
        // run a pass with the clock pushed past it. The same pass then retries
        // the freshly failed placement, since attempts (1) < max_attempts (3).
        let later = now + ChronoDuration::from_std(config.submit_timeout).unwrap()
            + ChronoDuration::seconds(1);
        let summary = run_once(&engine, &config, later).unwrap();
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.retried, 1);

        let stored = engine.db().get_placement(id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Submitted);
        assert_eq!(stored.attempts, 2);
    }

    #[test]
    fn retry_budget_is_bounded() {
        let now = Utc::now();
        let (engine, id) = engine_with_placement(now - ChronoDuration::minutes(1));

        // Burn through the attempt budget.
        engine.advance(id, LifecycleEvent::Submit).unwrap();
        engine.advance(id, LifecycleEvent::Fail).unwrap();
        engine.advance(id, LifecycleEvent::Retry).unwrap();
        engine.advance(id, LifecycleEvent::Fail).unwrap();
        engine.advance(id, LifecycleEvent::Retry).unwrap();
        engine.advance(id, LifecycleEvent::Fail).unwrap();

        let stored = engine.db().get_placement(id).unwrap().unwrap();
        assert_eq!(stored.attempts, 3);

        let summary = run_once(&engine, &DispatchConfig::default(), now).unwrap();
        assert_eq!(summary.retried, 0);

        let stored = engine.db().get_placement(id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Failed);
    }
}
