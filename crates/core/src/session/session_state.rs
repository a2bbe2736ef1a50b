use crate::codec::assignment_codec::Assignment;
use crate::shared::cancellation::CancellationToken;
use crate::shared::dispatch_error::DispatchError;

/// Lifecycle of a client session: running until stopped, subscribed once
/// a coordinator has assigned worker keys.
///
/// Only this type flips the flags; everything else reads them.
#[derive(Debug, Default)]
pub struct SessionState {
    running: CancellationToken,
    assignment: Option<Assignment>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_cancelled()
    }

    pub fn is_subscribed(&self) -> bool {
        self.assignment.is_some()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    /// Token tripped by [`stop`](Self::stop); hand clones to every loop the
    /// session drives.
    pub fn cancellation(&self) -> CancellationToken {
        self.running.clone()
    }

    pub fn subscribe(&mut self, assignment: Assignment) -> Result<(), DispatchError> {
        if let Some(current) = &self.assignment {
            return Err(DispatchError::AlreadySubscribed {
                channel: current.channel.clone(),
            });
        }
        self.assignment = Some(assignment);
        Ok(())
    }

    /// Stops the session. Returns the assignment whose channel must be
    /// unsubscribed, only on the first call after subscribing.
    pub fn stop(&mut self) -> Option<Assignment> {
        self.running.cancel();
        self.assignment.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(channel: &str) -> Assignment {
        Assignment {
            input_key: "in".into(),
            output_key: "out".into(),
            channel: channel.into(),
        }
    }

    #[test]
    fn test_new_session_is_running_and_unsubscribed() {
        let state = SessionState::new();
        assert!(state.is_running());
        assert!(!state.is_subscribed());
    }

    #[test]
    fn test_second_subscribe_fails() {
        let mut state = SessionState::new();
        state.subscribe(assignment("a")).unwrap();
        let err = state.subscribe(assignment("b")).unwrap_err();
        assert!(matches!(err, DispatchError::AlreadySubscribed { channel } if channel == "a"));
    }

    #[test]
    fn test_stop_cancels_token_and_returns_assignment_once() {
        let mut state = SessionState::new();
        let token = state.cancellation();
        state.subscribe(assignment("a")).unwrap();

        assert_eq!(state.stop().map(|a| a.channel), Some("a".to_string()));
        assert!(token.is_cancelled());
        assert!(!state.is_running());
        assert!(state.stop().is_none());
    }
}
