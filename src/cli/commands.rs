use std::fmt::Write as _;
use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::list::sort_notes;
use crate::app::App;
use crate::config::{AppConfig, SortMode};
use crate::storage::{Note, NoteDraft, Priority, StorageHandle};
use crate::ui::format_date;

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the note content inline. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
    /// high, medium, low or none
    #[arg(long, default_value_t = Priority::None)]
    pub priority: Priority,
    /// Hide the content in list and view screens
    #[arg(long)]
    pub obscured: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// priority-asc, priority-desc, date-asc or date-desc (defaults to the configured order)
    #[arg(long)]
    pub sort: Option<SortMode>,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn new_note(_config: Arc<AppConfig>, storage: StorageHandle, args: NewArgs) -> Result<()> {
    let title = match args.title {
        Some(t) => t,
        None => prompt("Title")?,
    };
    let content = match args.content {
        Some(content) => content,
        None => read_stdin()?.unwrap_or_default(),
    };
    let note = create_from_args(
        &storage,
        NoteDraft {
            title,
            content,
            priority: args.priority,
            links: Vec::new(),
            obscured: args.obscured,
        },
    )?;
    println!("Created note {} ({})", note.id, note.title);
    Ok(())
}

fn create_from_args(storage: &StorageHandle, draft: NoteDraft) -> Result<Note> {
    if draft.title.trim().is_empty() {
        bail!("note title cannot be empty");
    }
    if draft.content.trim().is_empty() {
        bail!("note content cannot be empty");
    }
    storage.create(draft).context("creating note")
}

pub fn list_notes(config: Arc<AppConfig>, storage: StorageHandle, args: ListArgs) -> Result<()> {
    let notes = storage.load_all().context("loading notes")?;
    let sort = args.sort.unwrap_or(config.list.default_sort);
    print!("{}", format_note_list(&sort_notes(&notes, sort)));
    Ok(())
}

fn format_note_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes yet.\n".to_string();
    }
    let mut out = String::new();
    for note in notes {
        let _ = writeln!(
            &mut out,
            "[{}] {}  {}  ({})",
            note.priority.badge(),
            note.title,
            format_date(note.created_at),
            note.id
        );
        if !note.obscured {
            for line in note.content.lines().take(2) {
                let _ = writeln!(&mut out, "    {line}");
            }
        }
        for link in &note.links {
            let _ = writeln!(&mut out, "    -> {} <{}>", link.title, link.url);
        }
    }
    out
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading note content from stdin")?;
    Ok(Some(buf))
}
