mod init;
pub use init::{cmd_init, init_vault};

use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveTime};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::LogLock;
use crate::io::log_io::{self, Vault};
use crate::model::document::LogDocument;
use crate::ops::actions::{self, Anchor, Applied};
use crate::ops::check::{self, CheckError, CheckWarning};
use crate::ops::derive::{DeriveOptions, cockpit};
use crate::ops::ids::generate_id;
use crate::ops::mutate::Refusal;
use crate::parse::classify::{is_done_line, is_running_line};
use crate::parse::build_records;
use crate::util::time::Clock;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Vault, day and clock a command runs against, resolved from the global flags.
pub struct Context {
    pub vault: Vault,
    pub date: NaiveDate,
    /// Current time; second precision unless `--at` pinned it
    pub time: NaiveTime,
    /// `--at` was given; the clock does not advance
    pub time_pinned: bool,
    pub json: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let start = match cli.vault_dir {
            Some(ref dir) => std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
            None => std::env::current_dir()?,
        };
        let root = log_io::discover_vault(&start);
        let vault = log_io::load_vault(&root)?;

        let date = match cli.date {
            Some(ref s) => log_io::parse_date(s)?,
            None => Local::now().date_naive(),
        };
        let time = match cli.at {
            Some(ref s) => Clock::parse_loose(s.trim())
                .ok_or_else(|| format!("invalid time: {} (expected HH:MM)", s))?
                .to_time(),
            None => Local::now().time(),
        };
        Ok(Context {
            vault,
            date,
            time,
            time_pinned: cli.at.is_some(),
            json: cli.json,
        })
    }

    fn clock(&self) -> Clock {
        Clock::from_time(self.time)
    }

    fn log_path(&self) -> PathBuf {
        self.vault.log_path(self.date)
    }

    fn derive_options(&self) -> DeriveOptions {
        DeriveOptions::from(&self.vault.config.cockpit)
    }

    fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        None => Err("no command given (run `tc` without arguments for the cockpit)".into()),
        Some(cmd) => match cmd {
            // Init is handled in main.rs before vault discovery
            Commands::Init(args) => cmd_init(args, cli.vault_dir.as_deref()),

            // Read commands
            Commands::Open(args) => cmd_open(&ctx, args),
            Commands::Status => cmd_status(&ctx),
            Commands::List(args) => cmd_list(&ctx, args),
            Commands::Check(args) => cmd_check(&ctx, args),

            // Write commands
            Commands::Add(args) => cmd_add(&ctx, args),
            Commands::Start(args) => cmd_start(&ctx, args),
            Commands::End => cmd_end(&ctx),
            Commands::EndStart(args) => cmd_end_start(&ctx, args),
            Commands::Resume => cmd_resume(&ctx),
            Commands::Memo(args) => cmd_memo(&ctx, args),
            Commands::Recalc(args) => cmd_recalc(&ctx, args),

            // Settings
            Commands::Config(args) => cmd_config(&ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// CLI lines are 1-based; the document is 0-indexed.
fn line_index(line: usize) -> Result<usize, String> {
    line.checked_sub(1)
        .ok_or_else(|| "line numbers start at 1".to_string())
}

/// Today's log text, or empty when the file does not exist yet.
fn read_text(ctx: &Context) -> Result<String, log_io::LogError> {
    let path = ctx.log_path();
    if !path.exists() {
        return Ok(String::new());
    }
    Ok(log_io::read_log(&path)?.to_text())
}

/// Lock, read, run `action`, write. A refusal leaves the file untouched.
fn apply_action(
    ctx: &Context,
    label: &str,
    action: impl FnOnce(&mut LogDocument) -> Result<Applied, Refusal>,
) -> CmdResult {
    let path = log_io::ensure_daily_log(&ctx.vault, ctx.date)?;
    let _lock = LogLock::acquire_default(&ctx.vault.log_dir())?;
    let mut doc = log_io::read_log(&path)?;

    let applied = action(&mut doc)?;
    log_io::write_log(&path, &doc)?;

    let text = doc.line(applied.cursor_line).map(str::to_string);
    if ctx.json {
        let out = ActionJson {
            ok: true,
            path: path.display().to_string(),
            line: Some(applied.cursor_line + 1),
            text,
            warning: applied.warning.as_ref().map(Refusal::to_string),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} line {}: {}",
            label,
            applied.cursor_line + 1,
            text.unwrap_or_default().trim()
        );
        if let Some(warning) = applied.warning {
            eprintln!("warning: {}", warning);
        }
    }
    Ok(())
}

/// Task text as written: title, then `(Nm)`, then `#must`.
fn compose_task_text(text: &str, estimate: Option<u32>, must: bool) -> String {
    let mut out = text.trim().to_string();
    if let Some(minutes) = estimate {
        out.push_str(&format!(" ({}m)", minutes));
    }
    if must {
        out.push_str(" #must");
    }
    out
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_open(ctx: &Context, args: OpenArgs) -> CmdResult {
    let date = if args.prev {
        log_io::prev_day(ctx.date)
    } else if args.next {
        log_io::next_day(ctx.date)
    } else {
        ctx.date
    };
    let created = !ctx.vault.log_path(date).exists();
    let path = log_io::ensure_daily_log(&ctx.vault, date)?;

    if ctx.json {
        let out = OpenJson {
            date: date.format("%Y-%m-%d").to_string(),
            path: path.display().to_string(),
            created,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_status(ctx: &Context) -> CmdResult {
    let text = read_text(ctx)?;
    let state = cockpit(&text, ctx.time, &ctx.derive_options());

    if ctx.json {
        let out = status_to_json(&state, ctx.date_label(), ctx.clock());
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_status(&state, &ctx.date_label(), ctx.clock()) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let text = read_text(ctx)?;
    let state = cockpit(&text, ctx.time, &ctx.derive_options());
    let records: Vec<_> = if args.all {
        state.records.iter().collect()
    } else {
        state
            .tasks
            .iter()
            .take(ctx.vault.config.cockpit.task_list_limit)
            .collect()
    };

    if ctx.json {
        let out: Vec<TaskJson> = records.into_iter().map(task_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if records.is_empty() {
        println!("no tasks");
    } else {
        for record in records {
            println!("{}", format_task_line(record));
        }
    }
    Ok(())
}

fn cmd_check(ctx: &Context, args: CheckArgs) -> CmdResult {
    let path = ctx.log_path();
    if !path.exists() {
        return Err(format!("no log for {} at {}", ctx.date_label(), path.display()).into());
    }

    let mut fixes = Vec::new();
    let doc = if args.fix {
        let _lock = LogLock::acquire_default(&ctx.vault.log_dir())?;
        let mut doc = log_io::read_log(&path)?;
        fixes = check::fix_ids(&mut doc, &mut generate_id);
        if !fixes.is_empty() {
            log_io::write_log(&path, &doc)?;
        }
        doc
    } else {
        log_io::read_log(&path)?
    };
    let result = check::check_log(&doc);

    if ctx.json {
        let out = CheckJson {
            result: &result,
            fixed: &fixes,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if !fixes.is_empty() {
        println!("IDs replaced:");
        for fix in &fixes {
            println!("  line {}: {} → {}", fix.line, fix.old_id, fix.new_id);
        }
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                CheckError::DuplicateId { id, lines } => {
                    println!("  id {} is used on lines {}", id, join_lines(lines));
                }
                CheckError::MultipleRunning { lines } => {
                    println!("  several tasks are running: lines {}", join_lines(lines));
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            match warn {
                CheckWarning::MissingStartTime { line, title } => {
                    println!("  line {}: ⌛ without start time under \"{}\"", line, title);
                }
                CheckWarning::UnreadableDone { line, title } => {
                    println!("  line {}: ✅ range unreadable under \"{}\"", line, title);
                }
                CheckWarning::MissingId { line, title } => {
                    println!("  line {}: task missing id: \"{}\"", line, title);
                }
            }
        }
    }
    if result.valid {
        println!("✓ log is valid");
    } else {
        println!("✗ log has errors (try --fix for duplicate ids)");
    }
    Ok(())
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let text = compose_task_text(&args.text, args.estimate, args.must);
    let anchor = match args.section {
        Some(name) => Anchor::Section(name),
        None => Anchor::End,
    };
    let now = ctx.clock();

    if args.start {
        apply_action(ctx, "started", |doc| {
            actions::insert_and_start(doc, &anchor, &text, now, &mut generate_id)
        })
    } else {
        apply_action(ctx, "added", |doc| actions::insert_task(doc, &anchor, &text))
    }
}

fn cmd_start(ctx: &Context, args: LineArg) -> CmdResult {
    let cursor = args.line.map(line_index).transpose()?;
    let now = ctx.clock();
    apply_action(ctx, "started", |doc| match cursor {
        Some(idx) => actions::start(doc, idx, now, &mut generate_id),
        None => {
            let parent = actions::first_unprocessed_parent(doc).ok_or(Refusal::NoStartCandidate)?;
            actions::start_at(doc, parent, now, &mut generate_id)
        }
    })
}

fn cmd_end(ctx: &Context) -> CmdResult {
    let now = ctx.clock();
    apply_action(ctx, "ended", |doc| actions::end(doc, now))
}

fn cmd_end_start(ctx: &Context, args: LineArg) -> CmdResult {
    let cursor = args.line.map(line_index).transpose()?;
    let now = ctx.clock();
    apply_action(ctx, "ended", |doc| {
        let cursor = cursor
            .or_else(|| doc.lines().iter().rposition(|l| is_running_line(l)))
            .ok_or(Refusal::NoRunningEntry)?;
        actions::end_and_start(doc, cursor, now, &mut generate_id)
    })
}

fn cmd_resume(ctx: &Context) -> CmdResult {
    apply_action(ctx, "resumed", |doc| actions::resume(doc, &mut generate_id))
}

fn cmd_memo(ctx: &Context, args: MemoArgs) -> CmdResult {
    let cursor = args.line.map(line_index).transpose()?;
    apply_action(ctx, "memo", |doc| {
        let cursor = match cursor {
            Some(idx) => idx,
            // Same entry the cockpit shows as now: the latest running line
            None => build_records(doc.lines())
                .iter()
                .filter_map(|r| r.running_child().map(|c| c.line))
                .max()
                .ok_or(Refusal::NoRunningEntry)?,
        };
        actions::insert_memo(doc, cursor, &args.text)
    })
}

fn cmd_recalc(ctx: &Context, args: LineArg) -> CmdResult {
    let cursor = args.line.map(line_index).transpose()?;
    apply_action(ctx, "recalculated", |doc| {
        let cursor = match cursor {
            Some(idx) => idx,
            None => doc
                .lines()
                .iter()
                .rposition(|l| is_done_line(l))
                .ok_or(Refusal::NoDoneEntry)?,
        };
        actions::recalculate(doc, cursor)
    })
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(ctx: &Context, args: ConfigCmd) -> CmdResult {
    let root = &ctx.vault.root;
    match args.action {
        ConfigAction::Get(a) => {
            let doc = config_io::read_config_doc(root)?;
            println!("{}", config_io::get_value(&doc, &a.key)?);
        }
        ConfigAction::Set(a) => {
            let mut doc = config_io::read_config_doc(root)?;
            config_io::set_value(&mut doc, &a.key, &a.value)?;
            config_io::write_config_doc(root, &doc)?;
            println!("{} = {}", a.key, config_io::get_value(&doc, &a.key)?);
        }
    }
    Ok(())
}
