use std::collections::HashSet;

use serde::Serialize;

use crate::formats::ModuleId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExpansionState {
    expanded: HashSet<ModuleId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ModuleId>,
    {
        Self {
            expanded: ids.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn toggle(&self, chapter_id: &ModuleId) -> Self {
        let mut next = self.clone();
        next.toggle_in_place(chapter_id);
        next
    }

    pub fn toggle_in_place(&mut self, chapter_id: &ModuleId) -> bool {
        if self.expanded.remove(chapter_id) {
            false
        } else {
            self.expanded.insert(chapter_id.clone());
            true
        }
    }

    pub fn contains(&self, chapter_id: &ModuleId) -> bool {
        self.expanded.contains(chapter_id)
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_all_collapsed() {
        let state = ExpansionState::new();
        assert!(state.is_empty());
        assert!(!state.contains(&ModuleId::new("c1")));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let id = ModuleId::new("c1");
        let opened = ExpansionState::new().toggle(&id);
        assert!(opened.contains(&id));

        let closed = opened.toggle(&id);
        assert!(!closed.contains(&id));
        assert!(closed.is_empty());
    }

    #[test]
    fn toggle_leaves_the_original_untouched() {
        let id = ModuleId::new("c1");
        let original = ExpansionState::seeded(["c2"]);
        let next = original.toggle(&id);

        assert!(!original.contains(&id));
        assert!(next.contains(&id));
        assert!(next.contains(&ModuleId::new("c2")));
    }

    #[test]
    fn toggle_in_place_reports_new_membership() {
        let id = ModuleId::new("c1");
        let mut state = ExpansionState::new();
        assert!(state.toggle_in_place(&id));
        assert!(!state.toggle_in_place(&id));
        assert_eq!(state.len(), 0);
    }
}
