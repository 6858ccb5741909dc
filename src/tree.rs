use std::collections::HashSet;

use serde::Serialize;

use crate::expansion::ExpansionState;
use crate::formats::{Chapter, HeaderType, Lesson, ModuleId, ModuleRecord, Section};

// Sections and lessons before the first chapter have no owner and are dropped
// without consuming a global lesson index.
pub fn build_tree(flat: &[ModuleRecord], expanded: &ExpansionState) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut current: Option<Chapter> = None;
    let mut chapter_index = 0usize;
    let mut global_lesson_index = 0usize;

    for record in flat {
        match record.header_type {
            HeaderType::Chapter => {
                if let Some(done) = current.take() {
                    chapters.push(done);
                }
                chapter_index += 1;
                current = Some(Chapter {
                    record: record.clone(),
                    chapter_index,
                    sections: Vec::new(),
                    direct_lessons: Vec::new(),
                    is_expanded: expanded.contains(&record.id),
                });
            }
            HeaderType::Section => {
                let Some(chapter) = current.as_mut() else {
                    tracing::debug!(module_id = %record.id, "section before any chapter; dropping");
                    continue;
                };
                chapter.sections.push(Section {
                    record: record.clone(),
                    lessons: Vec::new(),
                    is_expanded: true,
                });
            }
            HeaderType::Lesson => {
                let Some(chapter) = current.as_mut() else {
                    tracing::debug!(module_id = %record.id, "lesson before any chapter; dropping");
                    continue;
                };
                global_lesson_index += 1;
                let owner = match chapter.sections.last_mut() {
                    Some(section) => &mut section.lessons,
                    None => &mut chapter.direct_lessons,
                };
                let lesson_index = owner.len() + 1;
                owner.push(Lesson {
                    record: record.clone(),
                    lesson_index,
                    global_index: global_lesson_index,
                    is_completed: None,
                });
            }
        }
    }

    if let Some(done) = current {
        chapters.push(done);
    }

    chapters
}

pub fn mark_completed(chapters: &mut [Chapter], completed: &HashSet<ModuleId>) {
    for chapter in chapters {
        let lessons = chapter
            .direct_lessons
            .iter_mut()
            .chain(chapter.sections.iter_mut().flat_map(|s| s.lessons.iter_mut()));
        for lesson in lessons {
            lesson.is_completed = Some(completed.contains(&lesson.record.id));
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub chapters: usize,
    pub sections: usize,
    pub lessons: usize,
    pub completed_lessons: usize,
}

impl TreeStats {
    pub fn of(chapters: &[Chapter]) -> Self {
        let mut stats = Self {
            chapters: chapters.len(),
            ..Self::default()
        };
        for chapter in chapters {
            stats.sections += chapter.sections.len();
            for lesson in chapter.lessons() {
                stats.lessons += 1;
                if lesson.is_completed == Some(true) {
                    stats.completed_lessons += 1;
                }
            }
        }
        stats
    }
}
