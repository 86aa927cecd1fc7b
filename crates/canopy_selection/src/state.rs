//! `SelectionState`: per-session ordered selected-tag set with bounded undo
//! history (C5, spec §4.6).

use canopy_protocol::defaults::{SELECTION_RECENCY_WINDOW_SECS, UNDO_STACK_DEPTH};
use canopy_protocol::{FilterMode, MoveDirection};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// The available/selected split returned by every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionView {
    pub available: Vec<String>,
    pub selected: Vec<String>,
}

pub struct SelectionState {
    selected: Vec<String>,
    /// Bounded to [`UNDO_STACK_DEPTH`]; oldest entries discarded FIFO
    /// (spec's P3: `|undo_stack| <= 5`).
    undo_stack: VecDeque<Vec<String>>,
    filter_mode: FilterMode,
    last_json_match_at: Option<DateTime<Utc>>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            selected: Vec::new(),
            undo_stack: VecDeque::new(),
            filter_mode: FilterMode::FullExcel,
            last_json_match_at: None,
        }
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.filter_mode = mode;
    }

    /// Called by the matching coordinator when a JSON-match run completes;
    /// feeds the `clear()` preservation exception (spec §4.6).
    pub fn record_json_match_completed(&mut self, at: DateTime<Utc>) {
        self.last_json_match_at = Some(at);
    }

    fn push_undo_snapshot(&mut self) {
        if self.undo_stack.len() >= UNDO_STACK_DEPTH {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(self.selected.clone());
    }

    /// Exposed for clients performing multi-step edits to checkpoint before
    /// a logical group (spec §4.6 `save_snapshot`).
    pub fn save_snapshot(&mut self) {
        self.push_undo_snapshot();
    }

    /// Drop any selected name no longer in `universe` (invariant I-C1).
    fn enforce_universe(&mut self, universe: &BTreeSet<&str>) {
        let before = self.selected.len();
        self.selected.retain(|name| universe.contains(name.as_str()));
        let dropped = before - self.selected.len();
        if dropped > 0 {
            debug!(dropped, "dropped unknown names from selection (I-C1)");
        }
    }

    fn view(&self, universe: &[String]) -> SelectionView {
        let selected_set: BTreeSet<&str> = self.selected.iter().map(String::as_str).collect();
        let available = universe.iter().filter(|name| !selected_set.contains(name.as_str())).cloned().collect();
        SelectionView { available, selected: self.selected.clone() }
    }

    /// Move `tags` between available/selected, or select/deselect
    /// everything in `universe` when `select_all` is set (spec §4.6
    /// `move`). Pushes an undo snapshot before applying.
    pub fn move_tags(
        &mut self,
        tags: &[String],
        direction: MoveDirection,
        select_all: bool,
        universe: &[String],
    ) -> SelectionView {
        self.push_undo_snapshot();

        let universe_set: BTreeSet<&str> = universe.iter().map(String::as_str).collect();

        if select_all {
            self.selected = match direction {
                MoveDirection::ToSelected => universe.to_vec(),
                MoveDirection::ToAvailable => Vec::new(),
            };
        } else {
            match direction {
                MoveDirection::ToSelected => {
                    for tag in tags {
                        if universe_set.contains(tag.as_str()) && !self.selected.contains(tag) {
                            self.selected.push(tag.clone());
                        }
                    }
                }
                MoveDirection::ToAvailable => {
                    let to_remove: BTreeSet<&str> = tags.iter().map(String::as_str).collect();
                    self.selected.retain(|name| !to_remove.contains(name.as_str()));
                }
            }
        }

        self.enforce_universe(&universe_set);
        self.view(universe)
    }

    /// Replace selection order; entries no longer selected are dropped,
    /// order preserved, any missing selected entry is appended (spec §4.6
    /// `reorder`).
    pub fn reorder(&mut self, new_order: &[String]) {
        let current: BTreeSet<&str> = self.selected.iter().map(String::as_str).collect();
        let mut reordered: Vec<String> = new_order.iter().filter(|name| current.contains(name.as_str())).cloned().collect();

        let placed: BTreeSet<&str> = reordered.iter().map(String::as_str).collect();
        for name in &self.selected {
            if !placed.contains(name.as_str()) {
                reordered.push(name.clone());
            }
        }
        self.selected = reordered;
    }

    /// Pop the most recent snapshot. A no-op when the stack is empty (spec
    /// §8 scenario 4 leaves this open; this repo treats it as a no-op so
    /// repeated undo is always safe to call from a client).
    pub fn undo(&mut self, universe: &[String]) -> SelectionView {
        if let Some(previous) = self.undo_stack.pop_back() {
            self.selected = previous;
            let universe_set: BTreeSet<&str> = universe.iter().map(String::as_str).collect();
            self.enforce_universe(&universe_set);
        }
        self.view(universe)
    }

    /// Empty the selection and undo stack, unless a JSON-match completed
    /// within the last [`SELECTION_RECENCY_WINDOW_SECS`] (spec §4.6): the
    /// user likely wants to act on matches they just generated.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        if let Some(last_match) = self.last_json_match_at {
            let age = now.signed_duration_since(last_match);
            if age.num_seconds() >= 0 && (age.num_seconds() as u64) < SELECTION_RECENCY_WINDOW_SECS {
                debug!("clear() skipped: recent JSON-match within recency window");
                return;
            }
        }
        self.selected.clear();
        self.undo_stack.clear();
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn universe() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    #[test]
    fn move_to_selected_then_undo_restores_prior_selection() {
        let mut state = SelectionState::new();
        let universe = universe();

        state.move_tags(&["A".to_string()], MoveDirection::ToSelected, false, &universe);
        assert_eq!(state.selected(), &["A".to_string()]);

        state.move_tags(&["B".to_string()], MoveDirection::ToSelected, false, &universe);
        assert_eq!(state.selected(), &["A".to_string(), "B".to_string()]);

        state.undo(&universe);
        assert_eq!(state.selected(), &["A".to_string()]);

        state.undo(&universe);
        assert!(state.selected().is_empty());
    }

    #[test]
    fn undo_past_empty_stack_is_a_no_op() {
        let mut state = SelectionState::new();
        let universe = universe();
        state.undo(&universe);
        assert!(state.selected().is_empty());
    }

    #[test]
    fn undo_stack_bounded_to_five_entries() {
        let mut state = SelectionState::new();
        let universe = universe();
        for _ in 0..10 {
            state.move_tags(&["A".to_string()], MoveDirection::ToSelected, false, &universe);
        }
        assert!(state.undo_depth() <= 5);
    }

    #[test]
    fn reorder_drops_unknown_and_appends_missing() {
        let mut state = SelectionState::new();
        let universe = universe();
        state.move_tags(&["A".to_string(), "B".to_string()], MoveDirection::ToSelected, false, &universe);

        state.reorder(&["B".to_string(), "Z".to_string()]);
        assert_eq!(state.selected(), &["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn clear_preserves_selection_within_recency_window() {
        let mut state = SelectionState::new();
        let universe = universe();
        state.move_tags(&["A".to_string()], MoveDirection::ToSelected, false, &universe);

        let now = Utc::now();
        state.record_json_match_completed(now - ChronoDuration::seconds(60));
        state.clear(now);
        assert_eq!(state.selected(), &["A".to_string()]);
    }

    #[test]
    fn clear_empties_selection_outside_recency_window() {
        let mut state = SelectionState::new();
        let universe = universe();
        state.move_tags(&["A".to_string()], MoveDirection::ToSelected, false, &universe);

        let now = Utc::now();
        state.record_json_match_completed(now - ChronoDuration::seconds(600));
        state.clear(now);
        assert!(state.selected().is_empty());
    }

    #[test]
    fn unknown_names_are_dropped_from_selection_on_mutation() {
        let mut state = SelectionState::new();
        let small_universe = vec!["A".to_string()];
        state.move_tags(&["A".to_string(), "Ghost".to_string()], MoveDirection::ToSelected, false, &small_universe);
        assert_eq!(state.selected(), &["A".to_string()]);
    }
}
