use std::sync::Arc;

use anyhow::Context as _;

use crate::cli::{NavigateArgs, Step};
use crate::config::Config;
use crate::cursor::CompletionFlag;
use crate::formats::ModuleId;
use crate::source::FileModuleSource;
use crate::viewer::{CourseViewer, ViewState, ViewerOptions};

pub async fn run(args: NavigateArgs) -> anyhow::Result<()> {
    let state = navigate(args).await?;
    let json = serde_json::to_string_pretty(&state).context("serialize view state")?;
    println!("{json}");
    Ok(())
}

pub async fn navigate(args: NavigateArgs) -> anyhow::Result<ViewState> {
    let config = Config::from_env().context("load config")?;
    let source = Arc::new(FileModuleSource::open(&args.modules).context("open modules")?);
    let course_id = source
        .path()
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("course")
        .to_owned();

    let completion = Arc::new(CompletionFlag::new());
    let mut viewer = CourseViewer::load(
        source,
        &course_id,
        ViewerOptions {
            detail_policy: config.detail_policy,
            listener: Some(completion.clone()),
            ..ViewerOptions::default()
        },
    )
    .await
    .context("load course")?;

    if let Some(id) = args.select {
        viewer.select(ModuleId::from(id));
    }
    for id in args.click {
        viewer.click_chapter(&ModuleId::from(id));
    }
    for step in args.step {
        let change = match step {
            Step::Next => viewer.go_to_next(),
            Step::Prev => viewer.go_to_previous(),
        };
        if change.is_none() {
            tracing::debug!(?step, "step ignored at course boundary");
        }
    }

    let applied = viewer.drain_details().await;
    tracing::debug!(
        applied,
        completion_events = completion.events(),
        "navigation finished"
    );
    Ok(viewer.snapshot())
}
