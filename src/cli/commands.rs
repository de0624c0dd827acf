use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "itin", about = concat!("itinerary v", env!("CARGO_PKG_VERSION"), " - tasks, projects and the days they land on"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks in a view (default: the selected view)
    List(ListArgs),
    /// Show task details
    Show(ShowArgs),
    /// Add a task
    Add(AddArgs),
    /// Change a task's fields
    Edit(EditArgs),
    /// Toggle a task between open and completed
    Done(IdArg),
    /// Permanently delete a task
    Rm(IdArg),
    /// Project management
    Project(ProjectCmd),
    /// List saved filters with live counts
    Filters,
    /// Show counts for today, upcoming and each project
    Counts,
    /// View the recovery log
    Recovery(RecoveryArgs),
}

// ---------------------------------------------------------------------------
// Read args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct ListArgs {
    /// View to show: today, upcoming, project, label, filter
    pub view: Option<String>,
    /// Project to show (implies the project view)
    #[arg(long)]
    pub project: Option<String>,
    /// Saved filter to show (implies the filter view)
    #[arg(long)]
    pub filter: Option<String>,
    /// Label to show (implies the label view)
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID (or unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID (or unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Write args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Task description
    #[arg(long)]
    pub desc: Option<String>,
    /// Project ID, prefix or name (default: the selected project, else Inbox)
    #[arg(long)]
    pub project: Option<String>,
    /// Priority: low, medium, high
    #[arg(long)]
    pub priority: Option<String>,
    /// Due date: YYYY-MM-DD, YYYY-MM-DDTHH:MM, today, tomorrow
    #[arg(long)]
    pub due: Option<String>,
    /// Label (repeatable)
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description
    #[arg(long, conflicts_with = "clear_desc")]
    pub desc: Option<String>,
    /// Remove the description
    #[arg(long)]
    pub clear_desc: bool,
    /// Move to another project (ID, prefix or name)
    #[arg(long)]
    pub project: Option<String>,
    /// Priority: low, medium, high
    #[arg(long)]
    pub priority: Option<String>,
    /// New due date
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    /// Replace the labels (repeatable)
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Project management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List projects with open task counts
    List,
    /// Create a project
    Add(ProjectAddArgs),
    /// Rename a project
    Rename(ProjectRenameArgs),
    /// Change a project's color or icon
    Style(ProjectStyleArgs),
    /// Delete a project and all of its tasks
    Rm(ProjectIdArg),
}

#[derive(Args)]
pub struct ProjectAddArgs {
    /// Project name
    pub name: String,
    /// Display color (default: #3b82f6)
    #[arg(long)]
    pub color: Option<String>,
    /// Icon name
    #[arg(long)]
    pub icon: Option<String>,
}

#[derive(Args)]
pub struct ProjectRenameArgs {
    /// Project ID, prefix or name
    pub id: String,
    /// New name
    pub name: String,
}

#[derive(Args)]
pub struct ProjectStyleArgs {
    /// Project ID, prefix or name
    pub id: String,
    /// New color
    #[arg(long)]
    pub color: Option<String>,
    /// New icon
    #[arg(long, conflicts_with = "clear_icon")]
    pub icon: Option<String>,
    /// Remove the icon
    #[arg(long)]
    pub clear_icon: bool,
}

#[derive(Args)]
pub struct ProjectIdArg {
    /// Project ID, prefix or name
    pub id: String,
}
