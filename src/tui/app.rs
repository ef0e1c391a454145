use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveTime};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{debug, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::cli::handlers::Context;
use crate::io::lock::{LockError, LogLock};
use crate::io::log_io::{self, LogError, Vault};
use crate::io::watcher::LogWatcher;
use crate::model::cockpit::Cockpit;
use crate::model::document::LogDocument;
use crate::ops::actions::{self, Anchor, Applied};
use crate::ops::derive::{DeriveOptions, derive};
use crate::ops::ids::generate_id;
use crate::ops::mutate::Refusal;
use crate::parse::build_records;
use crate::util::time::Clock;

use super::input;
use super::render;
use super::theme::Theme;

/// Which view is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Now / next / must / ribbon dashboard
    Cockpit,
    /// The raw log, line by line
    Log,
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the status row
    Prompt(PromptKind),
}

/// What the prompt text becomes on Enter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    AddTask,
    AddAndStart,
    Memo,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::AddTask => "add",
            PromptKind::AddAndStart => "add+start",
            PromptKind::Memo => "memo",
        }
    }
}

/// One-line message in the status row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Why an action from the cockpit did not land on disk
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Refused(#[from] Refusal),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("log changed on disk; reloaded, try again")]
    Stale,
}

/// Main application state
pub struct App {
    pub vault: Vault,
    pub date: NaiveDate,
    pub path: PathBuf,
    pub doc: LogDocument,
    pub cockpit: Cockpit,
    pub view: View,
    pub mode: Mode,
    /// 0-indexed document line under the cursor
    pub cursor: usize,
    /// First visible row of the log view
    pub scroll_offset: usize,
    /// Log view hides every child line that is not ⌛
    pub focus_mode: bool,
    pub show_help: bool,
    pub notice: Option<Notice>,
    /// Prompt text being typed
    pub input: String,
    pub should_quit: bool,
    pub theme: Theme,
    pub options: DeriveOptions,
    /// Fixed clock from `--at`; None follows the wall clock
    pub pinned_time: Option<NaiveTime>,
    /// Time the cockpit was last derived at
    pub now: NaiveTime,
}

impl App {
    pub fn new(
        vault: Vault,
        date: NaiveDate,
        path: PathBuf,
        doc: LogDocument,
        pinned_time: Option<NaiveTime>,
    ) -> Self {
        let theme = Theme::from_config(&vault.config.ui);
        let options = DeriveOptions::from(&vault.config.cockpit);
        let focus_mode = vault.config.ui.focus_mode;
        let now = pinned_time.unwrap_or_else(|| Local::now().time());

        let mut app = App {
            vault,
            date,
            path,
            doc,
            cockpit: Cockpit::default(),
            view: View::Cockpit,
            mode: Mode::Navigate,
            cursor: 0,
            scroll_offset: 0,
            focus_mode,
            show_help: false,
            notice: None,
            input: String::new(),
            should_quit: false,
            theme,
            options,
            pinned_time,
            now,
        };
        app.refresh();
        app.cursor = app.default_cursor();
        app
    }

    /// Open the day's log (creating it) for `ctx`.
    pub fn open(ctx: Context) -> Result<Self, LogError> {
        let path = log_io::ensure_daily_log(&ctx.vault, ctx.date)?;
        let doc = log_io::read_log(&path)?;
        let pinned = ctx.time_pinned.then_some(ctx.time);
        Ok(App::new(ctx.vault, ctx.date, path, doc, pinned))
    }

    pub fn clock(&self) -> Clock {
        Clock::from_time(self.now)
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Re-derive the cockpit from the document at the current time.
    pub fn refresh(&mut self) {
        self.now = self.pinned_time.unwrap_or_else(|| Local::now().time());
        let records = build_records(self.doc.lines());
        self.cockpit = derive(&records, self.now, &self.options);
        self.clamp_cursor();
    }

    pub fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: true,
        });
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    /// Running entry if any, else the first unprocessed task, else the top.
    fn default_cursor(&self) -> usize {
        self.cockpit
            .now
            .as_ref()
            .and_then(|r| r.running_child().map(|c| c.line))
            .or_else(|| self.cockpit.next.as_ref().map(|r| r.start_line))
            .unwrap_or(0)
    }

    /// Document lines the log view shows, in order.
    pub fn visible_lines(&self) -> Vec<usize> {
        if self.focus_mode {
            actions::focus_lines(&self.doc)
        } else {
            (0..self.doc.len()).collect()
        }
    }

    /// Lines the cursor can stop on in the current view.
    fn cursor_stops(&self) -> Vec<usize> {
        match self.view {
            View::Log => self.visible_lines(),
            View::Cockpit => self.cockpit.tasks.iter().map(|r| r.start_line).collect(),
        }
    }

    fn clamp_cursor(&mut self) {
        let last = self.doc.len().saturating_sub(1);
        self.cursor = self.cursor.min(last);
    }

    /// Move by `delta` stops; snaps to the nearest stop first.
    pub fn move_cursor(&mut self, delta: isize) {
        let stops = self.cursor_stops();
        if stops.is_empty() {
            return;
        }
        let pos = match stops.binary_search(&self.cursor) {
            Ok(i) => i as isize + delta,
            // Between stops: down lands on the next one, up on the previous one
            Err(i) if delta > 0 => i as isize + delta - 1,
            Err(i) => i as isize + delta,
        };
        let pos = pos.clamp(0, stops.len() as isize - 1) as usize;
        self.cursor = stops[pos];
    }

    pub fn cursor_to_top(&mut self) {
        if let Some(first) = self.cursor_stops().first() {
            self.cursor = *first;
        }
    }

    pub fn cursor_to_bottom(&mut self) {
        if let Some(last) = self.cursor_stops().last() {
            self.cursor = *last;
        }
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Cockpit => View::Log,
            View::Log => View::Cockpit,
        };
    }

    pub fn toggle_focus(&mut self) {
        self.focus_mode = !self.focus_mode;
        if self.focus_mode && !self.visible_lines().contains(&self.cursor) {
            self.move_cursor(-1);
        }
        self.set_notice(if self.focus_mode {
            "focus mode on"
        } else {
            "focus mode off"
        });
    }

    // -----------------------------------------------------------------------
    // Disk
    // -----------------------------------------------------------------------

    /// Pick up edits made elsewhere. Quiet when nothing changed.
    pub fn reload_from_disk(&mut self) {
        match log_io::read_log(&self.path) {
            Ok(doc) if doc != self.doc => {
                debug!("reloaded {}", self.path.display());
                self.doc = doc;
                self.refresh();
                self.set_notice("reloaded (changed on disk)");
            }
            Ok(_) => {}
            Err(e) => {
                warn!("reload failed: {}", e);
                self.set_error(e.to_string());
            }
        }
    }

    /// Switch to another day's log, creating it if needed.
    pub fn switch_day(&mut self, date: NaiveDate) {
        let opened = log_io::ensure_daily_log(&self.vault, date)
            .and_then(|path| log_io::read_log(&path).map(|doc| (path, doc)));
        match opened {
            Ok((path, doc)) => {
                self.date = date;
                self.path = path;
                self.doc = doc;
                self.scroll_offset = 0;
                self.refresh();
                self.cursor = self.default_cursor();
                self.set_notice(format!("opened {}", self.date_label()));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Run `action` against the log under the lock and write the result.
    ///
    /// The file is re-read first; when it no longer matches what is on
    /// screen the action is dropped and the fresh text is shown instead.
    pub fn try_action(
        &mut self,
        action: impl FnOnce(&mut LogDocument, usize) -> Result<Applied, Refusal>,
    ) -> Result<Applied, ActionError> {
        let _lock = LogLock::acquire_default(&self.vault.log_dir())?;
        let on_disk = log_io::read_log(&self.path)?;
        if on_disk != self.doc {
            self.doc = on_disk;
            self.refresh();
            return Err(ActionError::Stale);
        }

        let mut doc = self.doc.clone();
        let applied = action(&mut doc, self.cursor)?;
        log_io::write_log(&self.path, &doc)?;

        self.doc = doc;
        self.cursor = applied.cursor_line;
        self.refresh();
        Ok(applied)
    }

    /// `try_action` plus a status-row notice either way.
    pub fn run_action(
        &mut self,
        label: &str,
        action: impl FnOnce(&mut LogDocument, usize) -> Result<Applied, Refusal>,
    ) {
        match self.try_action(action) {
            Ok(Applied {
                warning: Some(warning),
                ..
            }) => self.set_error(format!("{}, but {}", label, warning)),
            Ok(_) => self.set_notice(label),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Actions bound to keys
    // -----------------------------------------------------------------------

    pub fn start(&mut self) {
        let now = self.clock();
        self.run_action("started", |doc, cursor| {
            actions::start(doc, cursor, now, &mut generate_id)
        });
    }

    pub fn end(&mut self) {
        let now = self.clock();
        self.run_action("ended", |doc, _| actions::end(doc, now));
    }

    pub fn end_and_start(&mut self) {
        let now = self.clock();
        self.run_action("ended and started next", |doc, cursor| {
            actions::end_and_start(doc, cursor, now, &mut generate_id)
        });
    }

    pub fn resume(&mut self) {
        self.run_action("resumed", |doc, _| actions::resume(doc, &mut generate_id));
    }

    pub fn recalculate(&mut self) {
        self.run_action("recalculated", actions::recalculate);
    }

    pub fn begin_prompt(&mut self, kind: PromptKind) {
        if kind == PromptKind::Memo && actions::parent_of(&self.doc, self.cursor).is_none() {
            self.set_error(Refusal::NoParent.to_string());
            return;
        }
        self.input.clear();
        self.notice = None;
        self.mode = Mode::Prompt(kind);
    }

    pub fn cancel_prompt(&mut self) {
        self.input.clear();
        self.mode = Mode::Navigate;
    }

    /// Apply the typed prompt text.
    pub fn submit_prompt(&mut self) {
        let Mode::Prompt(kind) = self.mode else {
            return;
        };
        let text = std::mem::take(&mut self.input);
        self.mode = Mode::Navigate;

        let anchor = match actions::section_of(&self.doc, self.cursor) {
            Some(_) => Anchor::Cursor(self.cursor),
            None => Anchor::End,
        };
        let now = self.clock();
        match kind {
            PromptKind::AddTask => self.run_action("added", |doc, _| {
                actions::insert_task(doc, &anchor, &text)
            }),
            PromptKind::AddAndStart => self.run_action("added and started", |doc, _| {
                actions::insert_and_start(doc, &anchor, &text, now, &mut generate_id)
            }),
            PromptKind::Memo => self.run_action("memo added", |doc, cursor| {
                actions::insert_memo(doc, cursor, &text)
            }),
        }
    }
}

/// Run the cockpit until the user quits
pub fn run(ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open(ctx)?;

    let watcher = match LogWatcher::start(&app.vault.log_dir()) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("file watching disabled: {}", e);
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&LogWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.refresh();
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if let Some(w) = watcher
            && w.changed(&app.path)
        {
            app.reload_from_disk();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
