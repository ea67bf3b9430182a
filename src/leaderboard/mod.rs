use serde::Serialize;
use tracing::info;

use crate::{ReviewResult, Score};

/// Running statistics for one repository across the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub repo_key: String,
    pub review_count: u32,
    pub bugs_found: u32,
    pub last_score: Score,
}

/// Session leaderboard, always held sorted by review count, most first.
///
/// [`Leaderboard::record_review`] is the only write path. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a completed review into the statistics for `repo_key`.
    ///
    /// Every call counts, including repeats of the same result. Returns the
    /// updated sorted view.
    pub fn record_review(&mut self, repo_key: &str, result: &ReviewResult) -> &[LeaderboardEntry] {
        let found = u32::try_from(result.findings.len()).unwrap_or(u32::MAX);

        match self.entries.iter_mut().find(|e| e.repo_key == repo_key) {
            Some(entry) => {
                entry.review_count = entry.review_count.saturating_add(1);
                entry.bugs_found = entry.bugs_found.saturating_add(found);
                entry.last_score = result.overall_score;
            }
            None => self.entries.push(LeaderboardEntry {
                repo_key: repo_key.to_string(),
                review_count: 1,
                bugs_found: found,
                last_score: result.overall_score,
            }),
        }

        // Stable: ties keep their prior relative order.
        self.entries.sort_by(|a, b| b.review_count.cmp(&a.review_count));

        info!(repo = repo_key, found, score = %result.overall_score, "leaderboard updated");
        &self.entries
    }

    /// Read-only sorted projection.
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn get(&self, repo_key: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.repo_key == repo_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// User sentiment about a displayed review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vibe {
    Vibe,
    Hmm,
    NotMyVibe,
}

impl Vibe {
    pub const ALL: [Vibe; 3] = [Vibe::Vibe, Vibe::Hmm, Vibe::NotMyVibe];

    pub fn label(self) -> &'static str {
        match self {
            Vibe::Vibe => "Vibe!",
            Vibe::Hmm => "Hmm...",
            Vibe::NotMyVibe => "Not my vibe",
        }
    }

    fn index(self) -> usize {
        match self {
            Vibe::Vibe => 0,
            Vibe::Hmm => 1,
            Vibe::NotMyVibe => 2,
        }
    }
}

/// Count of each sentiment across the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VibeTally {
    counts: [u32; 3],
}

impl VibeTally {
    pub fn count(&self, vibe: Vibe) -> u32 {
        self.counts[vibe.index()]
    }

    /// Move one vote from `old` to `new`. Either side may be absent.
    pub fn apply(&mut self, new: Option<Vibe>, old: Option<Vibe>) {
        if let Some(old) = old {
            let slot = &mut self.counts[old.index()];
            *slot = slot.saturating_sub(1);
        }
        if let Some(new) = new {
            let slot = &mut self.counts[new.index()];
            *slot = slot.saturating_add(1);
        }
    }
}

/// The one active sentiment for the currently displayed result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackSelection {
    active: Option<Vibe>,
}

impl FeedbackSelection {
    pub fn active(&self) -> Option<Vibe> {
        self.active
    }

    /// Toggle `vibe`: clicking the active tag clears it, any other tag replaces it.
    pub fn click(&mut self, vibe: Vibe, tally: &mut VibeTally) {
        let old = self.active;
        let new = if old == Some(vibe) { None } else { Some(vibe) };
        self.active = new;
        tally.apply(new, old);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, Finding, Severity};

    fn result(findings: usize, score: Score) -> ReviewResult {
        ReviewResult {
            overall_score: score,
            good_vibes: vec![],
            findings: (0..findings)
                .map(|_| Finding {
                    category: Category::Security,
                    severity: Severity::Low,
                    description: String::new(),
                    impact: String::new(),
                    remediation: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn first_review_inserts_entry() {
        let mut board = Leaderboard::new();
        board.record_review("acme/widget", &result(12, Score::Green));

        let entry = board.get("acme/widget").unwrap();
        assert_eq!(entry.review_count, 1);
        assert_eq!(entry.bugs_found, 12);
        assert_eq!(entry.last_score, Score::Green);
    }

    #[test]
    fn repeat_reviews_accumulate() {
        let mut board = Leaderboard::new();
        board.record_review("acme/widget", &result(12, Score::Green));
        board.record_review("acme/widget", &result(12, Score::Green));
        board.record_review("acme/widget", &result(3, Score::Red));

        let entry = board.get("acme/widget").unwrap();
        assert_eq!(entry.review_count, 3);
        assert_eq!(entry.bugs_found, 27);
        assert_eq!(entry.last_score, Score::Red);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn view_sorted_by_review_count_descending() {
        let mut board = Leaderboard::new();
        board.record_review("a/one", &result(1, Score::Green));
        board.record_review("b/two", &result(1, Score::Green));
        let view = board.record_review("b/two", &result(1, Score::Green));

        let keys: Vec<_> = view.iter().map(|e| e.repo_key.as_str()).collect();
        assert_eq!(keys, vec!["b/two", "a/one"]);
        assert!(view.windows(2).all(|w| w[0].review_count >= w[1].review_count));
    }

    #[test]
    fn ties_keep_prior_order() {
        let mut board = Leaderboard::new();
        board.record_review("a/one", &result(1, Score::Green));
        board.record_review("b/two", &result(1, Score::Green));
        board.record_review("c/three", &result(1, Score::Green));
        let keys: Vec<_> = board.entries().iter().map(|e| e.repo_key.clone()).collect();
        assert_eq!(keys, vec!["a/one", "b/two", "c/three"]);

        board.record_review("c/three", &result(1, Score::Green));
        board.record_review("a/one", &result(1, Score::Green));
        let keys: Vec<_> = board.entries().iter().map(|e| e.repo_key.clone()).collect();
        assert_eq!(keys, vec!["c/three", "a/one", "b/two"]);
    }

    #[test]
    fn feedback_toggle_moves_single_vote() {
        let mut tally = VibeTally::default();
        let mut selection = FeedbackSelection::default();

        selection.click(Vibe::Vibe, &mut tally);
        assert_eq!(tally.count(Vibe::Vibe), 1);

        selection.click(Vibe::Hmm, &mut tally);
        assert_eq!(tally.count(Vibe::Vibe), 0);
        assert_eq!(tally.count(Vibe::Hmm), 1);
        assert_eq!(selection.active(), Some(Vibe::Hmm));

        selection.click(Vibe::Hmm, &mut tally);
        assert_eq!(tally.count(Vibe::Hmm), 0);
        assert_eq!(selection.active(), None);
    }

    #[test]
    fn tally_never_goes_negative() {
        let mut tally = VibeTally::default();
        tally.apply(None, Some(Vibe::NotMyVibe));
        assert_eq!(tally.count(Vibe::NotMyVibe), 0);
    }

    #[test]
    fn fresh_selection_per_result_keeps_earlier_votes() {
        let mut tally = VibeTally::default();
        let mut first = FeedbackSelection::default();
        first.click(Vibe::Vibe, &mut tally);

        let mut second = FeedbackSelection::default();
        second.click(Vibe::Vibe, &mut tally);
        assert_eq!(tally.count(Vibe::Vibe), 2);
    }
}
