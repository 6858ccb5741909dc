use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::formats::{ModuleId, ModuleRecord};

pub trait CompletionListener: Send + Sync {
    fn course_completed(&self, last_module: &ModuleId);
}

#[derive(Debug, Default)]
pub struct CompletionFlag {
    events: AtomicUsize,
}

impl CompletionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> usize {
        self.events.load(Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.events() > 0
    }
}

impl CompletionListener for CompletionFlag {
    fn course_completed(&self, last_module: &ModuleId) {
        tracing::info!(module_id = %last_module, "course complete");
        self.events.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorChange {
    pub previous: Option<ModuleId>,
    pub selected: ModuleId,
    pub course_complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationCursor {
    modules: Vec<ModuleId>,
    selected: Option<ModuleId>,
}

impl NavigationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, flat: &[ModuleRecord]) -> Option<CursorChange> {
        self.modules = flat.iter().map(|r| r.id.clone()).collect();
        if self.selected.is_some() {
            return None;
        }
        let first = self.modules.first()?.clone();
        self.select(first)
    }

    pub fn selected(&self) -> Option<&ModuleId> {
        self.selected.as_ref()
    }

    pub fn current_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.modules.iter().position(|id| id == selected)
    }

    pub fn total_modules(&self) -> usize {
        self.modules.len()
    }

    pub fn has_prev(&self) -> bool {
        matches!(self.current_index(), Some(idx) if idx > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.current_index(), Some(idx) if idx + 1 < self.modules.len())
    }

    pub fn is_course_complete(&self) -> bool {
        matches!(self.current_index(), Some(idx) if idx + 1 == self.modules.len())
    }

    pub fn select(&mut self, id: ModuleId) -> Option<CursorChange> {
        if self.selected.as_ref() == Some(&id) {
            return None;
        }
        let previous = self.selected.replace(id.clone());
        let change = CursorChange {
            previous,
            selected: id,
            course_complete: self.is_course_complete(),
        };
        tracing::debug!(
            module_id = %change.selected,
            index = ?self.current_index(),
            total = self.modules.len(),
            "module selected"
        );
        Some(change)
    }

    pub fn go_to_previous(&mut self) -> Option<CursorChange> {
        if !self.has_prev() {
            return None;
        }
        let idx = self.current_index()?;
        let target = self.modules[idx - 1].clone();
        self.select(target)
    }

    pub fn go_to_next(&mut self) -> Option<CursorChange> {
        if !self.has_next() {
            return None;
        }
        let idx = self.current_index()?;
        let target = self.modules[idx + 1].clone();
        self.select(target)
    }
}
