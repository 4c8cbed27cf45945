// file: src/pipeline/state.rs
// description: per-object processing states and their legal transitions
// reference: explicit state machine for one storage object

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Received,
    Eligible,
    Skipped,
    Parsed,
    BatchesPending,
    Redacting(usize),
    Redacted(usize),
    Reassembled,
    Written,
    Failed,
}

impl DocumentState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DocumentState::Skipped | DocumentState::Written | DocumentState::Failed
        )
    }

    pub fn can_transition_to(self, next: DocumentState) -> bool {
        use DocumentState::*;

        if self.is_terminal() {
            return false;
        }

        match (self, next) {
            (_, Failed) => self != Received,
            (Received, Eligible) | (Received, Skipped) => true,
            (Eligible, Parsed) => true,
            (Parsed, BatchesPending) => true,
            (BatchesPending, Redacting(0)) | (BatchesPending, Reassembled) => true,
            (Redacting(i), Redacted(j)) => i == j,
            (Redacted(i), Redacting(j)) => j == i + 1,
            (Redacted(_), Reassembled) => true,
            (Reassembled, Written) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentState::Received => write!(f, "received"),
            DocumentState::Eligible => write!(f, "eligible"),
            DocumentState::Skipped => write!(f, "skipped"),
            DocumentState::Parsed => write!(f, "parsed"),
            DocumentState::BatchesPending => write!(f, "batches_pending"),
            DocumentState::Redacting(i) => write!(f, "redacting[{}]", i),
            DocumentState::Redacted(i) => write!(f, "redacted[{}]", i),
            DocumentState::Reassembled => write!(f, "reassembled"),
            DocumentState::Written => write!(f, "written"),
            DocumentState::Failed => write!(f, "failed"),
        }
    }
}

/// Tracks the current state of one object and logs every move.
#[derive(Debug)]
pub struct StateTracker {
    label: String,
    current: DocumentState,
}

impl StateTracker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            current: DocumentState::Received,
        }
    }

    pub fn current(&self) -> DocumentState {
        self.current
    }

    pub fn advance(&mut self, next: DocumentState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        tracing::debug!("{}: {} -> {}", self.label, self.current, next);
        self.current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentState::*;

    #[test]
    fn test_happy_path() {
        let path = [
            Received,
            Eligible,
            Parsed,
            BatchesPending,
            Redacting(0),
            Redacted(0),
            Redacting(1),
            Redacted(1),
            Reassembled,
            Written,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_empty_document_path() {
        assert!(BatchesPending.can_transition_to(Reassembled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [Skipped, Written, Failed] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Failed));
            assert!(!terminal.can_transition_to(Eligible));
        }
    }

    #[test]
    fn test_batches_cannot_be_skipped() {
        assert!(!Redacted(0).can_transition_to(Redacting(2)));
        assert!(!Redacting(1).can_transition_to(Redacted(0)));
        assert!(!Parsed.can_transition_to(Written));
    }

    #[test]
    fn test_failure_from_any_active_state() {
        for state in [Eligible, Parsed, BatchesPending, Redacting(3), Reassembled] {
            assert!(state.can_transition_to(Failed));
        }
    }

    #[test]
    fn test_tracker_advances() {
        let mut tracker = StateTracker::new("uploads/incoming/a.csv");
        tracker.advance(Eligible);
        tracker.advance(Parsed);
        assert_eq!(tracker.current(), Parsed);
        assert_eq!(Redacting(2).to_string(), "redacting[2]");
        assert_eq!(BatchesPending.to_string(), "batches_pending");
    }
}
