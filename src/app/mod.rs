use std::io::Stdout;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::themes::ThemePalette;
use crate::config::AppConfig;
use crate::storage::{StorageError, StorageHandle};
use crate::ui;

pub mod actions;
pub mod buffer;
pub mod link;
pub mod list;
pub mod session;
pub mod state;
pub mod view;

pub use actions::{ActionDispatcher, SystemOpener, UrlOpener};
pub use state::{AppState, Command, EditorScreen, Mode};

pub struct App {
    pub config: Arc<AppConfig>,
    pub storage: StorageHandle,
    state: AppState,
    palette: ThemePalette,
    opener: Box<dyn UrlOpener>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Arc<AppConfig>, storage: StorageHandle) -> Result<Self> {
        let notes = storage
            .load_all()
            .context("loading notes for initial state")?;
        let (theme, palette) = storage.load_theme().context("loading theme")?;
        tracing::info!(%theme, notes = notes.len(), "starting interface");
        let state = AppState::new(
            notes,
            config.list.default_sort,
            config.editor.layout.into(),
        );
        Ok(Self {
            config,
            storage,
            state,
            palette,
            opener: Box::new(SystemOpener),
            should_quit: false,
        })
    }

    pub fn with_opener(mut self, opener: Box<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, &self.state, &self.palette, &self.config.list))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            // Resize and other events just fall through to the next draw,
            // which re-reads the frame size.
            if let Event::Key(key) = event::read().context("reading terminal event")? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(command) = self.state.handle_key(key) {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Quit => self.should_quit = true,
            Command::OpenUrl(url) => {
                if let Err(err) = self.opener.open_url(&url) {
                    tracing::error!(?err, %url, "failed to open link");
                    self.state.set_status_message(Some("Could not open link"));
                }
            }
            Command::Commit(commit) => {
                let creating = commit.note_id.is_none();
                match ActionDispatcher::new(&self.storage).save(commit) {
                    Ok(note) => {
                        self.state.finish_commit();
                        self.refresh(Some(&note.id));
                        self.state.set_status_message(Some(if creating {
                            "Note created"
                        } else {
                            "Note saved"
                        }));
                    }
                    Err(err) => self.report(err, "save note"),
                }
            }
            Command::Persist { note_id, update } => {
                match ActionDispatcher::new(&self.storage).persist(&note_id, update) {
                    Ok(note) => {
                        self.state.sync_viewed_note(note);
                        self.refresh(Some(&note_id));
                    }
                    Err(err) => {
                        self.restore_viewed_note(&note_id);
                        self.report(err, "update note");
                    }
                }
            }
            Command::SetPriority { note_id, priority } => {
                match ActionDispatcher::new(&self.storage).set_priority(&note_id, priority) {
                    Ok(_) => self.refresh(Some(&note_id)),
                    Err(err) => self.report(err, "change priority"),
                }
            }
            Command::ToggleObscured(note_id) => {
                match ActionDispatcher::new(&self.storage).toggle_obscured(&note_id) {
                    Ok(_) => self.refresh(Some(&note_id)),
                    Err(err) => self.report(err, "toggle obscured"),
                }
            }
            Command::Delete(note_id) => {
                match ActionDispatcher::new(&self.storage).delete(&note_id) {
                    Ok(true) => {
                        self.refresh(None);
                        self.state.set_status_message(Some("Note deleted"));
                    }
                    Ok(false) => self.report(StorageError::NotFound(note_id), "delete note"),
                    Err(err) => self.report(err, "delete note"),
                }
            }
        }
    }

    fn report(&mut self, err: StorageError, action: &str) {
        match err {
            StorageError::NotFound(note_id) => {
                tracing::warn!(%note_id, action, "note no longer exists");
                self.state.return_to_list();
                self.refresh(None);
                self.state
                    .set_status_message(Some("That note no longer exists"));
            }
            err => {
                tracing::error!(?err, "failed to {action}");
                self.state
                    .set_status_message(Some(format!("Failed to {action}: {err}")));
            }
        }
    }

    /// The view applies its change before the write; put the stored copy back
    /// so the screen never shows edits that did not reach disk.
    fn restore_viewed_note(&mut self, note_id: &str) {
        match self.storage.get_by_id(note_id) {
            Ok(Some(note)) => self.state.sync_viewed_note(note),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(?err, %note_id, "could not re-read note, leaving view");
                self.state.return_to_list();
            }
        }
    }

    /// Reload the whole collection; on failure the in-memory copy stays.
    fn refresh(&mut self, focus: Option<&str>) {
        match self.storage.load_all() {
            Ok(notes) => self.state.replace_notes(notes, focus),
            Err(err) => {
                tracing::error!(?err, "failed to reload notes from storage");
                self.state
                    .set_status_message(Some(format!("Failed to reload notes: {err}")));
            }
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
