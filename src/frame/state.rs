use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::sdk::{AddFrameOutcome, SessionContext};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameState {
    pub view_id: Uuid,
    pub status: LifecycleStatus,
    pub context: Option<SessionContext>,
    pub added: bool,
    pub add_frame_result: Option<String>,
    pub mounted_at: Option<DateTime<Utc>>,
    /// Set once at unmount; every later write is refused.
    #[serde(skip)]
    pub disposed: bool,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            view_id: Uuid::new_v4(),
            status: LifecycleStatus::Uninitialized,
            context: None,
            added: false,
            add_frame_result: None,
            mounted_at: None,
            disposed: false,
        }
    }
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The load guard: only the first call moves out of `Uninitialized`.
    pub fn begin_loading(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != LifecycleStatus::Uninitialized {
            return false;
        }
        self.status = LifecycleStatus::Initializing;
        self.mounted_at = Some(now);
        true
    }

    pub fn apply_context(&mut self, context: SessionContext) {
        self.added = context.client.added;
        self.context = Some(context);
    }

    pub fn set_added(&mut self, added: bool) {
        self.added = added;
    }

    pub fn record_add_frame(&mut self, outcome: &AddFrameOutcome) {
        self.add_frame_result = Some(outcome.describe());
    }

    pub fn mark_ready(&mut self) {
        self.status = LifecycleStatus::Ready;
    }

    pub fn mark_timed_out(&mut self) {
        if self.status == LifecycleStatus::Initializing {
            self.status = LifecycleStatus::TimedOut;
        }
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_guard_fires_once() {
        let mut state = FrameState::new();
        assert!(state.begin_loading(Utc::now()));
        assert!(!state.begin_loading(Utc::now()));
        assert_eq!(state.status, LifecycleStatus::Initializing);
    }

    #[test]
    fn context_sets_added_and_events_override() {
        let mut state = FrameState::new();
        state.apply_context(SessionContext::with_added(true));
        assert!(state.added);

        state.set_added(false);
        assert!(!state.added);
        assert_eq!(state.context.as_ref().map(|c| c.client.added), Some(true));
    }

    #[test]
    fn timeout_only_applies_while_initializing() {
        let mut state = FrameState::new();
        state.mark_timed_out();
        assert_eq!(state.status, LifecycleStatus::Uninitialized);

        state.begin_loading(Utc::now());
        state.mark_ready();
        state.mark_timed_out();
        assert_eq!(state.status, LifecycleStatus::Ready);
    }
}
