use std::fmt::Write as _;
use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::App;
use crate::config::AppConfig;
use crate::filter::{count_label, FilterQuery, PriorityFilter};
use crate::notes::{util, Note, NoteBook, NoteDraft, Priority};
use crate::storage::{NoteStore, SaveOutcome};
use crate::weather::{known_cities, lookup_city, WeatherClient};

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the note content inline. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,
    /// Priority (low, medium, high); defaults to the configured priority
    #[arg(long)]
    pub priority: Option<Priority>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only show notes whose title, content, or tags contain this text
    #[arg(long)]
    pub search: Option<String>,
    /// Only show notes with this priority (low, medium, high)
    #[arg(long)]
    pub priority: Option<Priority>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Identifier of the note to delete
    #[arg(required_unless_present = "all")]
    pub id: Option<String>,
    /// Delete every note
    #[arg(long, conflicts_with = "id")]
    pub all: bool,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    /// Identifier of the note to move
    pub source: String,
    /// Identifier of the note it will be placed before
    pub target: String,
}

#[derive(Args, Debug, Clone)]
pub struct WeatherArgs {
    /// City name to look up
    pub city: String,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn add_note(config: Arc<AppConfig>, store: NoteStore, args: AddArgs) -> Result<()> {
    let title = match args.title {
        Some(title) => title,
        None => prompt("Title")?,
    };
    let content = if let Some(content) = args.content {
        content
    } else {
        read_stdin()?.unwrap_or_default()
    };
    let draft = NoteDraft {
        title,
        content,
        tags: args
            .tags
            .as_deref()
            .map(util::parse_tags)
            .unwrap_or_default(),
        priority: args.priority.unwrap_or(config.default_priority),
    };

    let mut book = NoteBook::from_notes(store.load());
    let id = book.create(draft)?;
    persist(&store, &book)?;
    println!("Created note {id}");
    Ok(())
}

pub fn list_notes(store: NoteStore, args: ListArgs) -> Result<()> {
    let book = NoteBook::from_notes(store.load());
    let query = FilterQuery {
        search: args.search.unwrap_or_default(),
        priority: args
            .priority
            .map(PriorityFilter::Only)
            .unwrap_or_default(),
    };
    print!("{}", format_list(&book, &query));
    Ok(())
}

pub fn delete_notes(store: NoteStore, args: DeleteArgs) -> Result<()> {
    let mut book = NoteBook::from_notes(store.load());
    if args.all {
        if book.is_empty() {
            println!("Nothing to delete.");
            return Ok(());
        }
        if !args.yes && !confirm(&format!("Delete all {}?", count_label(book.len())))? {
            println!("Canceled.");
            return Ok(());
        }
        let dropped = book.clear();
        persist(&store, &book)?;
        println!("Deleted {}", count_label(dropped));
        return Ok(());
    }

    let Some(id) = args.id else {
        bail!("either a note id or --all is required");
    };
    let Some(note) = book.get(&id) else {
        bail!("note '{id}' not found");
    };
    let title = note.title.clone();
    if !args.yes && !confirm(&format!("Delete '{title}'?"))? {
        println!("Canceled.");
        return Ok(());
    }
    book.remove(&id);
    persist(&store, &book)?;
    println!("Deleted '{title}'");
    Ok(())
}

pub fn move_note(store: NoteStore, args: MoveArgs) -> Result<()> {
    let mut book = NoteBook::from_notes(store.load());
    if book.get(&args.source).is_none() {
        bail!("note '{}' not found", args.source);
    }
    if book.get(&args.target).is_none() {
        bail!("note '{}' not found", args.target);
    }
    if !book.reorder(&args.source, &args.target) {
        println!("Nothing to move.");
        return Ok(());
    }
    persist(&store, &book)?;
    println!("Moved '{}' before '{}'", args.source, args.target);
    Ok(())
}

pub fn city_weather(config: Arc<AppConfig>, args: WeatherArgs) -> Result<()> {
    let (city, coords) = match lookup_city(&args.city) {
        Ok(resolved) => resolved,
        Err(err) => {
            bail!("{err} (known cities: {})", known_cities().join(", "));
        }
    };
    let client = WeatherClient::new(&config.weather).context("building weather HTTP client")?;
    let current = client
        .fetch_current(coords)
        .with_context(|| format!("fetching weather for {city}"))?;
    println!("Weather in {city}");
    println!("Temperature: {}°C", current.temperature);
    println!("Windspeed: {} km/h", current.windspeed);
    Ok(())
}

fn format_list(book: &NoteBook, query: &FilterQuery) -> String {
    let visible = query.apply(book.notes());
    if visible.is_empty() {
        if book.is_empty() {
            return "No notes yet.\n".to_string();
        }
        return "No notes match the current filter.\n".to_string();
    }
    let mut out = String::new();
    for note in &visible {
        let _ = writeln!(&mut out, "{}  {}  [{}]", note.id, note.title, note.priority);
        let _ = writeln!(&mut out, "    updated {}", util::format_date(note.updated_at));
        if !note.tags.is_empty() {
            let _ = writeln!(&mut out, "    tags    {}", format_tags(&note.tags));
        }
        if let Some(snippet) = build_snippet(note, 2) {
            let _ = writeln!(&mut out, "    {snippet}");
        }
        out.push('\n');
    }
    let _ = writeln!(&mut out, "{}", count_label(visible.len()));
    out
}

fn persist(store: &NoteStore, book: &NoteBook) -> Result<()> {
    match store.save(book.notes()) {
        SaveOutcome::Saved => Ok(()),
        SaveOutcome::Failed { reason } => bail!("saving notes: {reason}"),
    }
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

fn confirm(question: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("refusing to delete without --yes when stdin is not a terminal");
    }
    let answer = prompt(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

fn build_snippet(note: &Note, lines: usize) -> Option<String> {
    let mut segments = Vec::new();
    for line in note.content.lines().take(lines) {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            segments.push(trimmed.to_string());
        }
    }
    if segments.is_empty() {
        None
    } else {
        let snippet = segments.join(" ");
        Some(snippet.chars().take(160).collect())
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}
