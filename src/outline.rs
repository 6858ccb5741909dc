use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use url::Url;

use crate::cli::{FetchArgs, OutlineArgs, OutputFormat};
use crate::config::Config;
use crate::expansion::ExpansionState;
use crate::formats::{Chapter, Lesson, ModuleId};
use crate::source::{HttpModuleSource, ModuleSource as _, read_module_records};
use crate::tree::{TreeStats, build_tree, mark_completed};

pub fn run(args: OutlineArgs) -> anyhow::Result<()> {
    if args.select.is_some() && !matches!(args.format, OutputFormat::Text) {
        anyhow::bail!("--select only applies to --format text");
    }

    let modules_path = PathBuf::from(&args.modules);
    let records = read_module_records(&modules_path).context("read modules")?;

    let expanded = ExpansionState::seeded(args.expand);
    let mut chapters = build_tree(&records, &expanded);
    if !args.completed.is_empty() {
        let completed = args
            .completed
            .into_iter()
            .map(ModuleId::from)
            .collect::<HashSet<_>>();
        mark_completed(&mut chapters, &completed);
    }

    let stats = TreeStats::of(&chapters);
    tracing::info!(
        modules = records.len(),
        chapters = stats.chapters,
        sections = stats.sections,
        lessons = stats.lessons,
        "built course outline"
    );

    let selected = args.select.map(ModuleId::from);
    print!("{}", format_outline(&chapters, selected.as_ref(), args.format)?);
    Ok(())
}

pub async fn fetch(args: FetchArgs) -> anyhow::Result<()> {
    let config = Config::from_env().context("load config")?;
    let base_url = match args.base_url {
        Some(raw) => Url::parse(&raw).with_context(|| format!("parse base url: {raw}"))?,
        None => config
            .base_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--base-url or COURSENAV_BASE_URL is required"))?,
    };

    let source = HttpModuleSource::new(base_url, config.http_timeout)?;
    let records = source
        .fetch_course_modules(&args.course)
        .await
        .with_context(|| format!("fetch course: {}", args.course))?;

    let chapters = build_tree(&records, &ExpansionState::seeded(args.expand));
    print!("{}", format_outline(&chapters, None, args.format)?);
    Ok(())
}

pub fn format_outline(
    chapters: &[Chapter],
    selected: Option<&ModuleId>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_outline(chapters, selected)),
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(chapters).context("serialize outline json")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Yaml => serde_yaml::to_string(chapters).context("serialize outline yaml"),
    }
}

pub fn render_outline(chapters: &[Chapter], selected: Option<&ModuleId>) -> String {
    let mut out = String::new();
    for chapter in chapters {
        let marker = match (chapter.has_children(), chapter.is_expanded) {
            (false, _) => "   ",
            (true, true) => "[-]",
            (true, false) => "[+]",
        };
        let _ = writeln!(
            out,
            "{}{marker} {}. {}",
            cursor_mark(&chapter.record.id, selected),
            chapter.chapter_index,
            chapter.record.title
        );
        if !chapter.is_expanded {
            continue;
        }
        for lesson in &chapter.direct_lessons {
            push_lesson(&mut out, lesson, selected, 1);
        }
        for section in &chapter.sections {
            let _ = writeln!(
                out,
                "{}      {}",
                cursor_mark(&section.record.id, selected),
                section.record.title
            );
            for lesson in &section.lessons {
                push_lesson(&mut out, lesson, selected, 2);
            }
        }
    }
    out
}

fn push_lesson(out: &mut String, lesson: &Lesson, selected: Option<&ModuleId>, depth: usize) {
    let indent = "    ".repeat(depth);
    let done = if lesson.is_completed == Some(true) {
        " (done)"
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "{}  {indent}{}. {} [#{}]{done}",
        cursor_mark(&lesson.record.id, selected),
        lesson.lesson_index,
        lesson.record.title,
        lesson.global_index
    );
}

fn cursor_mark(id: &ModuleId, selected: Option<&ModuleId>) -> &'static str {
    if selected == Some(id) { "> " } else { "  " }
}
