use std::sync::{Arc, Mutex};

use crate::session::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Generate,
    Edit,
    Regenerate,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Generate => "generate",
            Action::Edit => "edit",
            Action::Regenerate => "regenerate",
        }
    }
}

// Clears `in_flight` on drop.
pub struct ActionGuard {
    state: Arc<Mutex<SessionState>>,
    action: Action,
}

impl ActionGuard {
    pub(crate) fn reserve(
        state: &Arc<Mutex<SessionState>>,
        locked: &mut SessionState,
        action: Action,
    ) -> Self {
        locked.in_flight = Some(action);
        log::debug!("{} started", action.as_str());
        ActionGuard {
            state: Arc::clone(state),
            action,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.in_flight == Some(self.action) {
            state.in_flight = None;
        }
        log::debug!("{} finished", self.action.as_str());
    }
}
