use slate_types::status::{LifecycleEvent, PostStatus};

/// The placement lifecycle transition table.
///
/// Returns the target status for a valid (status, event) pair, `None` for
/// everything else. The caller decides how a rejection surfaces; this
/// function never coerces state.
pub fn next_status(from: PostStatus, event: LifecycleEvent) -> Option<PostStatus> {
    use LifecycleEvent::*;
    use PostStatus::*;

    match (from, event) {
        (Scheduled, Submit) => Some(Submitted),
        (Scheduled, Cancel) => Some(Cancelled),
        (Submitted, Acknowledge) => Some(Pending),
        (Submitted, Fail) => Some(Failed),
        (Pending, Confirm) => Some(Posted),
        (Pending, Reject) => Some(Rejected),
        (Pending, Fail) => Some(Failed),
        (Failed, Retry) => Some(Submitted),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleEvent::*;
    use PostStatus::*;

    const VALID: [(PostStatus, LifecycleEvent, PostStatus); 8] = [
        (Scheduled, Submit, Submitted),
        (Scheduled, Cancel, Cancelled),
        (Submitted, Acknowledge, Pending),
        (Submitted, Fail, Failed),
        (Pending, Confirm, Posted),
        (Pending, Reject, Rejected),
        (Pending, Fail, Failed),
        (Failed, Retry, Submitted),
    ];

    #[test]
    fn valid_pairs_reach_their_target() {
        for (from, event, to) in VALID {
            assert_eq!(next_status(from, event), Some(to), "{from} + {event}");
        }
    }

    #[test]
    fn everything_else_is_rejected() {
        for from in PostStatus::ALL {
            for event in LifecycleEvent::ALL {
                let expected = VALID
                    .iter()
                    .find(|(f, e, _)| *f == from && *e == event)
                    .map(|(_, _, to)| *to);
                assert_eq!(next_status(from, event), expected, "{from} + {event}");
            }
        }
        // Sanity: the sweep above covers exactly the eight valid pairs.
        let valid_count = PostStatus::ALL
            .iter()
            .flat_map(|f| LifecycleEvent::ALL.iter().map(move |e| (*f, *e)))
            .filter(|(f, e)| next_status(*f, *e).is_some())
            .count();
        assert_eq!(valid_count, 8);
    }

    #[test]
    fn terminal_states_accept_no_event() {
        for from in [Posted, Cancelled, Rejected] {
            for event in LifecycleEvent::ALL {
                assert_eq!(next_status(from, event), None, "{from} + {event}");
            }
        }
    }

    #[test]
    fn no_regression_without_retry() {
        // The only path back out of a sink state is FAILED -> SUBMITTED.
        assert_eq!(next_status(Posted, Retry), None);
        assert_eq!(next_status(Rejected, Retry), None);
        assert_eq!(next_status(Cancelled, Retry), None);
        assert_eq!(next_status(Failed, Retry), Some(Submitted));
    }
}
