use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the chapter/section/lesson sidebar for a course file.
    Outline(OutlineArgs),
    /// Move the navigation cursor through a course file and print the view state.
    Navigate(NavigateArgs),
    /// Load a course from a REST backend and print its sidebar.
    Fetch(FetchArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Step {
    Next,
    Prev,
}

#[derive(Debug, Args)]
pub struct OutlineArgs {
    /// Course modules file (`.json`, `.jsonl` or `.yaml`).
    #[arg(long)]
    pub modules: String,

    /// Chapter id to show expanded (repeatable).
    #[arg(long)]
    pub expand: Vec<String>,

    /// Lesson id the learner has completed (repeatable).
    #[arg(long)]
    pub completed: Vec<String>,

    /// Module id to mark as selected (text format only).
    #[arg(long)]
    pub select: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct NavigateArgs {
    /// Course modules file (`.json`, `.jsonl` or `.yaml`).
    #[arg(long)]
    pub modules: String,

    /// Module to select after loading (default: the first module).
    #[arg(long)]
    pub select: Option<String>,

    /// Chapter header to click after selecting (repeatable).
    #[arg(long)]
    pub click: Vec<String>,

    /// Cursor step to apply, in order (repeatable).
    #[arg(long, value_enum)]
    pub step: Vec<Step>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// REST backend base URL (default: `COURSENAV_BASE_URL`).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Course id.
    #[arg(long)]
    pub course: String,

    /// Chapter id to show expanded (repeatable).
    #[arg(long)]
    pub expand: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
