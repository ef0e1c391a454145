use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tc", about = concat!("chute v", env!("CARGO_PKG_VERSION"), " - a TaskChute cockpit for plain-text daily logs"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different vault directory
    #[arg(short = 'C', long = "vault-dir", global = true)]
    pub vault_dir: Option<String>,

    /// Work on the log of this day (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    pub date: Option<String>,

    /// Use this clock time (HH:MM) instead of the local time
    #[arg(long, global = true, value_name = "HH:MM")]
    pub at: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a chute.toml in the current directory
    Init(InitArgs),
    /// Create the day's log if needed and print its path
    Open(OpenArgs),
    /// Show now / next / must / remaining
    Status,
    /// List tasks that are not done yet
    List(ListArgs),
    /// Add a task line
    Add(AddArgs),
    /// Start a task (default: the first unprocessed one)
    Start(LineArg),
    /// End the running entry
    End,
    /// End the running entry and start the next task
    #[command(name = "end-start")]
    EndStart(LineArg),
    /// Reopen the latest ✅ entry
    Resume,
    /// Add a 📝 memo under a task
    Memo(MemoArgs),
    /// Recompute the +Nm of a ✅ entry
    Recalc(LineArg),
    /// Validate the log
    Check(CheckArgs),
    /// Read or change chute.toml
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Setup args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Folder for daily logs, relative to the vault
    #[arg(long)]
    pub folder: Option<String>,
    /// Overwrite an existing chute.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct OpenArgs {
    /// The day before --date (or today)
    #[arg(long, conflicts_with = "next")]
    pub prev: bool,
    /// The day after --date (or today)
    #[arg(long)]
    pub next: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Include done tasks
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Give duplicated ids a fresh value
    #[arg(long)]
    pub fix: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// Estimate in minutes, written as (Nm)
    #[arg(long, short = 'e', value_parser = clap::value_parser!(u32).range(1..=999))]
    pub estimate: Option<u32>,
    /// Mark as #must
    #[arg(long)]
    pub must: bool,
    /// Start it right away
    #[arg(long)]
    pub start: bool,
    /// Append to the end of this ## section instead of the log
    #[arg(long)]
    pub section: Option<String>,
}

/// Optional 1-based line number
#[derive(Args)]
pub struct LineArg {
    /// Line number (1-based)
    pub line: Option<usize>,
}

#[derive(Args)]
pub struct MemoArgs {
    /// Memo text
    pub text: String,
    /// Line of the task or entry to attach to (default: the running task)
    #[arg(long)]
    pub line: Option<usize>,
}

// ---------------------------------------------------------------------------
// Config args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a value, e.g. `cockpit.must_limit`
    Get(ConfigGetArgs),
    /// Set a value, keeping comments in chute.toml
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}
