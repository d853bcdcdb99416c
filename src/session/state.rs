//! Session state machine
//!
//! `Disconnected` → `Connecting` → `Connected` → `Closed` | `Errored`.
//! Errors may end any live state; terminal states never change again.

use std::fmt;

/// Lifecycle state of a [`SessionClient`](crate::session::SessionClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closed,
    Errored,
}

impl SessionState {
    /// Returns whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Errored)
    }

    /// Returns whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Disconnected, Connecting) => true,
            (Connecting, Connected) => true,
            (Connecting | Connected, Errored) => true,
            (Disconnected | Connecting | Connected, Closed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
            SessionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState::*;
    use super::*;

    const ALL: [SessionState; 5] = [Disconnected, Connecting, Connected, Closed, Errored];

    #[test]
    fn happy_path_is_allowed() {
        assert!(Disconnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Closed));
    }

    #[test]
    fn errors_only_from_live_transport() {
        assert!(Connecting.can_transition_to(Errored));
        assert!(Connected.can_transition_to(Errored));
        assert!(!Disconnected.can_transition_to(Errored));
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [Closed, Errored] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn no_skipping_or_going_back() {
        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Connecting));
        assert!(!Connecting.can_transition_to(Disconnected));
    }
}
