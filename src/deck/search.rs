//! # Card Search
//!
//! Case-insensitive substring search over the cards of one deck, plus the
//! trailing [`Debouncer`] that delays a search until typing pauses.

use super::store::Deck;
use std::time::{Duration, Instant};

/// Quiet period before a typed query is searched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Indices of cards whose front or back contains `query`. A blank query
/// matches nothing.
pub fn find_matches(deck: &Deck, query: &str) -> Vec<usize> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    deck.cards
        .iter()
        .enumerate()
        .filter(|(_, card)| {
            card.front.to_lowercase().contains(&query) || card.back.to_lowercase().contains(&query)
        })
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    query: String,
    matches: Vec<usize>,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// A non-blank query has been searched.
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Search `deck` for `query` and return the first match, if any.
    pub fn run(&mut self, deck: Option<&Deck>, query: &str) -> Option<usize> {
        self.query = query.to_string();
        self.matches = deck.map(|d| find_matches(d, query)).unwrap_or_default();
        self.matches.first().copied()
    }

    /// Re-run the current query, e.g. after the deck's cards changed.
    pub fn refresh(&mut self, deck: Option<&Deck>) {
        let query = std::mem::take(&mut self.query);
        self.run(deck, &query);
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
    }
}

/// Trailing debounce. Every [`schedule`](Debouncer::schedule) pushes the
/// deadline out; [`poll`](Debouncer::poll) fires once after it passes.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::store::Card;

    fn deck(fronts: &[&str]) -> Deck {
        Deck {
            id: 1,
            name: "Test".to_string(),
            cards: fronts
                .iter()
                .enumerate()
                .map(|(i, f)| Card {
                    id: i as u64 + 1,
                    front: f.to_string(),
                    back: String::new(),
                })
                .collect(),
            current_index: 0,
        }
    }

    #[test]
    fn test_find_matches_case_insensitive() {
        let d = deck(&["Hola", "adios", "HOLA amigo", "gracias", "por favor"]);
        assert_eq!(find_matches(&d, "hola"), vec![0, 2]);
        assert!(find_matches(&d, "   ").is_empty());
    }

    #[test]
    fn test_matches_back_text() {
        let mut d = deck(&["one"]);
        d.cards[0].back = "Uno".to_string();
        assert_eq!(find_matches(&d, "uno"), vec![0]);
    }

    #[test]
    fn test_run_returns_first_match() {
        let d = deck(&["a", "cat", "b", "catalog"]);
        let mut search = SearchState::default();
        assert_eq!(search.run(Some(&d), "cat"), Some(1));
        assert_eq!(search.match_count(), 2);
        assert!(search.is_active());

        assert_eq!(search.run(None, "cat"), None);
        assert_eq!(search.match_count(), 0);
    }

    #[test]
    fn test_refresh_after_change() {
        let mut d = deck(&["cat", "dog"]);
        let mut search = SearchState::default();
        search.run(Some(&d), "dog");
        d.cards.remove(0);
        search.refresh(Some(&d));
        assert_eq!(search.matches(), &[0]);
        assert_eq!(search.query(), "dog");
        search.clear();
        assert!(!search.is_active());
    }

    #[test]
    fn test_debouncer_only_fires_after_quiet_period() {
        let start = Instant::now();
        let mut debounce = Debouncer::new(Duration::from_millis(300));
        debounce.schedule(start);
        assert!(!debounce.poll(start + Duration::from_millis(200)));

        // A new keystroke restarts the timer
        debounce.schedule(start + Duration::from_millis(200));
        assert!(!debounce.poll(start + Duration::from_millis(400)));
        assert!(debounce.poll(start + Duration::from_millis(500)));
        assert!(!debounce.poll(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_debouncer_cancel() {
        let start = Instant::now();
        let mut debounce = Debouncer::default();
        debounce.schedule(start);
        debounce.cancel();
        assert!(!debounce.is_pending());
        assert!(!debounce.poll(start + Duration::from_secs(1)));
    }
}
