//! Scheduled-action queue for delayed, cancellable session effects.

use std::time::Duration;

use grid_assault_core::{InvaderId, Transition};

/// Deferred effect fired against the session clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionAction {
    /// Start the death animation of an invader caught in a kill ring.
    IgniteInvader(InvaderId),
    /// Lower the transient extra-life flag.
    ClearExtraLifeFlag,
    /// Bring the player ship back after a lost life.
    RespawnPlayer,
    /// Hand a scene transition to the host.
    Transition(Transition),
}

/// World-owned queue of `(fire_at, action)` entries.
///
/// Cleared wholesale whenever a wave or session is torn down, so a pending
/// action can never strike state that outlived it.
#[derive(Debug, Default)]
pub(crate) struct ActionQueue {
    entries: Vec<Entry>,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    fire_at: Duration,
    action: SessionAction,
}

impl ActionQueue {
    pub(crate) fn schedule(&mut self, fire_at: Duration, action: SessionAction) {
        self.entries.push(Entry { fire_at, action });
    }

    /// Removes and returns every entry due at `now`, earliest first.
    pub(crate) fn drain_due(&mut self, now: Duration) -> Vec<SessionAction> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].fire_at <= now {
                due.push(self.entries.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|entry| entry.fire_at);
        due.into_iter().map(|entry| entry.action).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_due_entries_earliest_first() {
        let mut queue = ActionQueue::default();
        queue.schedule(Duration::from_millis(300), SessionAction::RespawnPlayer);
        queue.schedule(Duration::from_millis(100), SessionAction::ClearExtraLifeFlag);
        queue.schedule(
            Duration::from_millis(500),
            SessionAction::IgniteInvader(InvaderId::new(7)),
        );

        let due = queue.drain_due(Duration::from_millis(300));

        assert_eq!(
            due,
            vec![
                SessionAction::ClearExtraLifeFlag,
                SessionAction::RespawnPlayer,
            ],
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn clearing_cancels_everything_pending() {
        let mut queue = ActionQueue::default();
        queue.schedule(
            Duration::from_millis(50),
            SessionAction::Transition(Transition::GameOver),
        );
        queue.clear();
        assert!(queue.drain_due(Duration::from_secs(10)).is_empty());
        assert_eq!(queue.len(), 0);
    }
}
