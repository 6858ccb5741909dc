use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::DetailPolicy;
use crate::cursor::{CompletionListener, CursorChange, NavigationCursor};
use crate::expansion::ExpansionState;
use crate::formats::{Chapter, ModuleDetail, ModuleId, ModuleRecord};
use crate::source::ModuleSource;
use crate::tree::{build_tree, mark_completed};

#[derive(Clone, Default)]
pub struct ViewerOptions {
    pub detail_policy: DetailPolicy,
    pub expanded: ExpansionState,
    pub completed: Option<HashSet<ModuleId>>,
    pub listener: Option<Arc<dyn CompletionListener>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub seq: u64,
    pub module_id: ModuleId,
}

#[derive(Debug)]
pub struct DetailResponse {
    pub ticket: DetailTicket,
    pub result: anyhow::Result<ModuleDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub course_id: String,
    pub chapters: Vec<Chapter>,
    pub selected_module_id: Option<ModuleId>,
    pub current_index: Option<usize>,
    pub total_modules: usize,
    pub has_prev_module: bool,
    pub has_next_module: bool,
    pub course_complete: bool,
    pub detail_module_id: Option<ModuleId>,
    pub detail: Option<ModuleDetail>,
    pub detail_error: Option<String>,
    pub pending_details: usize,
}

pub struct CourseViewer {
    course_id: String,
    source: Arc<dyn ModuleSource>,
    runtime: tokio::runtime::Handle,
    policy: DetailPolicy,
    modules: Vec<ModuleRecord>,
    expansion: ExpansionState,
    completed: Option<HashSet<ModuleId>>,
    chapters: Vec<Chapter>,
    cursor: NavigationCursor,
    listener: Option<Arc<dyn CompletionListener>>,
    next_seq: u64,
    latest: Option<DetailTicket>,
    detail: Option<(ModuleId, ModuleDetail)>,
    detail_error: Option<String>,
    in_flight: usize,
    detail_tx: mpsc::UnboundedSender<DetailResponse>,
    detail_rx: mpsc::UnboundedReceiver<DetailResponse>,
}

impl CourseViewer {
    pub async fn load(
        source: Arc<dyn ModuleSource>,
        course_id: &str,
        options: ViewerOptions,
    ) -> anyhow::Result<Self> {
        let modules = source
            .fetch_course_modules(course_id)
            .await
            .with_context(|| format!("fetch course modules: {course_id}"))?;
        tracing::info!(course_id, modules = modules.len(), "course loaded");

        let (detail_tx, detail_rx) = mpsc::unbounded_channel();
        let mut viewer = Self {
            course_id: course_id.to_owned(),
            source,
            runtime: tokio::runtime::Handle::current(),
            policy: options.detail_policy,
            modules,
            expansion: options.expanded,
            completed: options.completed,
            chapters: Vec::new(),
            cursor: NavigationCursor::new(),
            listener: options.listener,
            next_seq: 0,
            latest: None,
            detail: None,
            detail_error: None,
            in_flight: 0,
            detail_tx,
            detail_rx,
        };
        viewer.rebuild_tree();

        let change = viewer.cursor.initialize(&viewer.modules);
        viewer.after_change(change);
        Ok(viewer)
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn cursor(&self) -> &NavigationCursor {
        &self.cursor
    }

    pub fn is_expanded(&self, chapter_id: &ModuleId) -> bool {
        self.expansion.contains(chapter_id)
    }

    pub fn detail(&self) -> Option<&ModuleDetail> {
        self.detail.as_ref().map(|(_, detail)| detail)
    }

    pub fn toggle(&mut self, chapter_id: &ModuleId) -> bool {
        let expanded = self.expansion.toggle_in_place(chapter_id);
        tracing::debug!(chapter_id = %chapter_id, expanded, "chapter toggled");
        self.rebuild_tree();
        expanded
    }

    pub fn set_completed(&mut self, completed: HashSet<ModuleId>) {
        self.completed = Some(completed);
        self.rebuild_tree();
    }

    pub fn select(&mut self, module_id: ModuleId) -> Option<CursorChange> {
        let change = self.cursor.select(module_id);
        self.after_change(change.clone());
        change
    }

    pub fn go_to_previous(&mut self) -> Option<CursorChange> {
        let change = self.cursor.go_to_previous();
        self.after_change(change.clone());
        change
    }

    pub fn go_to_next(&mut self) -> Option<CursorChange> {
        let change = self.cursor.go_to_next();
        self.after_change(change.clone());
        change
    }

    pub fn click_chapter(&mut self, chapter_id: &ModuleId) -> Option<CursorChange> {
        let has_children = self
            .chapters
            .iter()
            .find(|c| &c.record.id == chapter_id)
            .is_some_and(Chapter::has_children);
        if has_children {
            self.toggle(chapter_id);
        }
        self.select(chapter_id.clone())
    }

    pub async fn next_detail(&mut self) -> Option<DetailOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let response = self.detail_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.apply_detail(response))
    }

    pub async fn drain_details(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.next_detail().await {
            if outcome == DetailOutcome::Applied {
                applied += 1;
            }
        }
        applied
    }

    pub fn apply_detail(&mut self, response: DetailResponse) -> DetailOutcome {
        let DetailResponse { ticket, result } = response;
        let current = match self.policy {
            DetailPolicy::LastResponseWins => true,
            DetailPolicy::DiscardStale => {
                self.latest.as_ref() == Some(&ticket)
                    && self.cursor.selected() == Some(&ticket.module_id)
            }
        };
        if !current {
            tracing::debug!(
                module_id = %ticket.module_id,
                seq = ticket.seq,
                "discarding stale module detail"
            );
            return DetailOutcome::Stale;
        }

        match result {
            Ok(detail) => {
                self.detail = Some((ticket.module_id, detail));
                self.detail_error = None;
            }
            Err(err) => {
                tracing::warn!(module_id = %ticket.module_id, ?err, "module detail fetch failed");
                self.detail = None;
                self.detail_error = Some(format!("{err:#}"));
            }
        }
        DetailOutcome::Applied
    }

    pub fn snapshot(&self) -> ViewState {
        ViewState {
            course_id: self.course_id.clone(),
            chapters: self.chapters.clone(),
            selected_module_id: self.cursor.selected().cloned(),
            current_index: self.cursor.current_index(),
            total_modules: self.cursor.total_modules(),
            has_prev_module: self.cursor.has_prev(),
            has_next_module: self.cursor.has_next(),
            course_complete: self.cursor.is_course_complete(),
            detail_module_id: self.detail.as_ref().map(|(id, _)| id.clone()),
            detail: self.detail().cloned(),
            detail_error: self.detail_error.clone(),
            pending_details: self.in_flight,
        }
    }

    fn rebuild_tree(&mut self) {
        let mut chapters = build_tree(&self.modules, &self.expansion);
        if let Some(completed) = &self.completed {
            mark_completed(&mut chapters, completed);
        }
        self.chapters = chapters;
    }

    fn after_change(&mut self, change: Option<CursorChange>) {
        let Some(change) = change else {
            return;
        };
        if change.course_complete
            && let Some(listener) = &self.listener
        {
            listener.course_completed(&change.selected);
        }
        self.request_detail(change.selected);
    }

    fn request_detail(&mut self, module_id: ModuleId) {
        self.next_seq += 1;
        let ticket = DetailTicket {
            seq: self.next_seq,
            module_id,
        };
        self.latest = Some(ticket.clone());
        self.in_flight += 1;

        let source = Arc::clone(&self.source);
        let module_id = ticket.module_id.clone();
        let reply = DetailReply {
            ticket: Some(ticket),
            tx: self.detail_tx.clone(),
        };
        self.runtime.spawn(async move {
            let result = source.fetch_module_detail(&module_id).await;
            reply.send(result);
        });
    }
}

// Resolves its ticket exactly once, with an error if the fetch task is dropped
// or panics before producing a result.
struct DetailReply {
    ticket: Option<DetailTicket>,
    tx: mpsc::UnboundedSender<DetailResponse>,
}

impl DetailReply {
    fn send(mut self, result: anyhow::Result<ModuleDetail>) {
        if let Some(ticket) = self.ticket.take() {
            self.deliver(ticket, result);
        }
    }

    fn deliver(&self, ticket: DetailTicket, result: anyhow::Result<ModuleDetail>) {
        if self.tx.send(DetailResponse { ticket, result }).is_err() {
            tracing::debug!("viewer closed before module detail arrived");
        }
    }
}

impl Drop for DetailReply {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            let err =
                anyhow::anyhow!("module detail fetch did not complete: {}", ticket.module_id);
            self.deliver(ticket, Err(err));
        }
    }
}
