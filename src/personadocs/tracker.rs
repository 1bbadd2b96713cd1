//! Bookkeeping of which participants have already contributed to a run.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;

/// First participant in `roster` order whose id is not in `acted`.
///
/// Returns `None` exactly when every roster id has acted. This is the reference
/// round-robin policy: deterministic, and each id is returned at most once per run as
/// long as the caller records every selection in `acted`.
///
/// ```
/// use personadocs::tracker::next_eligible;
/// use std::collections::HashSet;
///
/// let roster = vec!["A".to_string(), "B".to_string()];
/// let mut acted = HashSet::new();
/// assert_eq!(next_eligible(&acted, &roster), Some("A"));
/// acted.insert("A".to_string());
/// assert_eq!(next_eligible(&acted, &roster), Some("B"));
/// acted.insert("B".to_string());
/// assert_eq!(next_eligible(&acted, &roster), None);
/// ```
pub fn next_eligible<'a>(acted: &HashSet<String>, roster: &'a [String]) -> Option<&'a str> {
    roster
        .iter()
        .find(|id| !acted.contains(id.as_str()))
        .map(|id| id.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The id is not part of the roster.
    UnknownParticipant(String),
    /// The id already contributed in this run.
    AlreadyActed(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::UnknownParticipant(id) => write!(f, "Unknown participant: {}", id),
            TrackerError::AlreadyActed(id) => write!(f, "Participant already acted: {}", id),
        }
    }
}

impl Error for TrackerError {}

/// The roster of one run plus the set of ids that already acted.
///
/// Created fresh per run; never shared across runs.
#[derive(Debug, Clone)]
pub struct ParticipationTracker {
    roster: Vec<String>,
    acted: HashSet<String>,
    // acted ids in the order they were recorded
    acted_order: Vec<String>,
}

impl ParticipationTracker {
    pub fn new(roster: Vec<String>) -> Self {
        Self {
            roster,
            acted: HashSet::new(),
            acted_order: Vec::new(),
        }
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn acted(&self) -> &HashSet<String> {
        &self.acted
    }

    /// Ids that acted, in the order they were marked.
    pub fn acted_order(&self) -> &[String] {
        &self.acted_order
    }

    pub fn has_acted(&self, id: &str) -> bool {
        self.acted.contains(id)
    }

    /// `true` when `id` is on the roster and has not acted yet.
    pub fn is_eligible(&self, id: &str) -> bool {
        !self.has_acted(id) && self.roster.iter().any(|r| r == id)
    }

    /// See [`next_eligible`].
    pub fn next_eligible(&self) -> Option<&str> {
        next_eligible(&self.acted, &self.roster)
    }

    /// Roster ids that have not acted yet, in roster order.
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.roster
            .iter()
            .filter(move |id| !self.acted.contains(id.as_str()))
            .map(|id| id.as_str())
    }

    /// Record that `id` contributed. Refuses ids outside the roster and repeats.
    pub fn mark_acted(&mut self, id: &str) -> Result<(), TrackerError> {
        if !self.roster.iter().any(|r| r == id) {
            return Err(TrackerError::UnknownParticipant(id.to_string()));
        }
        if !self.acted.insert(id.to_string()) {
            return Err(TrackerError::AlreadyActed(id.to_string()));
        }
        self.acted_order.push(id.to_string());
        Ok(())
    }

    pub fn acted_count(&self) -> usize {
        self.acted.len()
    }

    pub fn roster_len(&self) -> usize {
        self.roster.len()
    }

    /// Every roster id acted.
    pub fn is_complete(&self) -> bool {
        self.acted.len() == self.roster.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ParticipationTracker {
        ParticipationTracker::new(vec!["A".into(), "B".into(), "C".into()])
    }

    #[test]
    fn test_next_eligible_follows_roster_order() {
        let mut t = tracker();
        let mut order = Vec::new();
        while let Some(id) = t.next_eligible().map(str::to_string) {
            t.mark_acted(&id).unwrap();
            order.push(id);
        }
        assert_eq!(order, vec!["A", "B", "C"]);
        assert!(t.is_complete());
        assert_eq!(t.acted_order(), &["A", "B", "C"]);
    }

    #[test]
    fn test_acted_participant_is_never_reselected() {
        let mut t = tracker();
        t.mark_acted("B").unwrap();
        for _ in 0..3 {
            assert_ne!(t.next_eligible(), Some("B"));
        }
        assert_eq!(t.remaining().collect::<Vec<_>>(), vec!["A", "C"]);
        assert!(!t.is_eligible("B"));
    }

    #[test]
    fn test_mark_acted_rejects_repeats_and_strangers() {
        let mut t = tracker();
        t.mark_acted("A").unwrap();
        assert_eq!(
            t.mark_acted("A"),
            Err(TrackerError::AlreadyActed("A".into()))
        );
        assert_eq!(
            t.mark_acted("Z"),
            Err(TrackerError::UnknownParticipant("Z".into()))
        );
        assert_eq!(t.acted_count(), 1);
    }

    #[test]
    fn test_none_only_when_roster_exhausted() {
        let mut t = tracker();
        t.mark_acted("A").unwrap();
        t.mark_acted("C").unwrap();
        assert_eq!(t.next_eligible(), Some("B"));
        t.mark_acted("B").unwrap();
        assert_eq!(t.next_eligible(), None);
    }
}
