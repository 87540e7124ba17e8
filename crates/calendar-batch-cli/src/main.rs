//! `calbatch` CLI: build a batch of relative events and export it as an `.ics` calendar.
//!
//! ## Usage
//!
//! ```sh
//! # Load a template (current or legacy shape) into the working list
//! calbatch import -i "Travel - template.json"
//!
//! # Pin the batch to a start date and name it
//! calbatch config --start-date 2025-04-14 --batch-name "Trip"
//!
//! # Add an event two days in, at 14:30, lasting 90 minutes
//! calbatch add --summary "Museum" --days 2 --time 14:30 --duration 01:30
//!
//! # Inspect, reorder and export
//! calbatch list
//! calbatch sort
//! calbatch export --out-dir ~/Downloads
//!
//! # Save the working list back as a template
//! calbatch save-template -o travel.json
//! ```
//!
//! The working list and batch configuration persist between invocations in
//! `--store-dir` (default: the platform data directory).

mod store;

use anyhow::{bail, Context, Result};
use calendar_batch::duration::{duration_from_days_entry, duration_from_time_entry};
use calendar_batch::schedule::display_start;
use calendar_batch::{
    parse_template, template_file_name, BatchConfig, Event, EventDefaults, Session, StartDate,
};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use store::FileStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "calbatch",
    version,
    about = "Build batches of relative calendar events and export them as iCalendar files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the cached event list and batch configuration
    #[arg(long, global = true, env = "CALBATCH_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "CALBATCH_LOG", default_value = "warn")]
    log_level: String,

    /// Hour of the batch start day at which newly added events begin
    #[arg(
        long,
        global = true,
        env = "CALBATCH_DEFAULT_START_HOUR",
        default_value_t = 9,
        value_parser = clap::value_parser!(u32).range(0..24)
    )]
    default_start_hour: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the working list with the events of a template file
    Import {
        /// Template file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Show or change the batch configuration
    Config {
        /// Batch start date, e.g. 2025-04-14 or 2025-04-14T08:00:00
        #[arg(long, conflicts_with = "clear_start_date")]
        start_date: Option<String>,
        /// Forget the batch start date
        #[arg(long)]
        clear_start_date: bool,
        /// Name prefixed to every exported event summary
        #[arg(long)]
        batch_name: Option<String>,
        /// Template name used in exported file names and UIDs
        #[arg(long)]
        template_name: Option<String>,
    },
    /// Append a new event to the working list and print its id
    Add {
        /// Event title
        #[arg(long, default_value = "")]
        summary: String,
        /// Free-text notes
        #[arg(long, default_value = "")]
        description: String,
        /// Make the event span whole days
        #[arg(long)]
        whole_day: bool,
        /// Leave the event out of exports
        #[arg(long)]
        excluded: bool,
        #[command(flatten)]
        timing: TimingArgs,
    },
    /// Change fields of an existing event
    Edit {
        /// Id of the event to change
        id: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Switch between timed and whole-day (true/false)
        #[arg(long)]
        whole_day: Option<bool>,
        #[command(flatten)]
        timing: TimingArgs,
    },
    /// Flip whether an event is included in exports
    Toggle {
        /// Id of the event to toggle
        id: String,
    },
    /// Delete an event from the working list
    Remove {
        /// Id of the event to delete
        id: String,
    },
    /// Order the working list by start offset
    Sort,
    /// Print the working list
    List {
        /// Print the list as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write the iCalendar document for the included events
    Export {
        /// Output file (writes to stdout if omitted)
        #[arg(short, long, conflicts_with = "out_dir")]
        output: Option<String>,
        /// Directory to write into, using the generated export file name
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Write the working list as a template file
    SaveTemplate {
        /// Output file (writes to stdout if omitted)
        #[arg(short, long, conflicts_with = "out_dir")]
        output: Option<String>,
        /// Directory to write into, using the generated template file name
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

/// Offset and duration entries, typed the same way as in the event editor.
#[derive(Args)]
struct TimingArgs {
    /// Whole weeks after the batch start
    #[arg(long, allow_hyphen_values = true)]
    weeks: Option<String>,
    /// Days after the start of that week
    #[arg(long, allow_hyphen_values = true)]
    days: Option<String>,
    /// Time of day as HH:MM (ignored for whole-day events)
    #[arg(long)]
    time: Option<String>,
    /// HH:MM span for timed events, a day count for whole-day events
    #[arg(long)]
    duration: Option<String>,
}

impl TimingArgs {
    fn apply(&self, event: &mut Event) {
        let whole_day = event.is_whole_day_event;
        if self.weeks.is_some() || self.days.is_some() || self.time.is_some() {
            let mut parts = event.start_offset_parts();
            if let Some(weeks) = &self.weeks {
                parts = parts.with_weeks_entry(weeks);
            }
            if let Some(days) = &self.days {
                parts = parts.with_days_entry(days, whole_day);
            }
            if let Some(time) = &self.time {
                parts = parts.with_time_entry(time);
            }
            event.set_start_offset_parts(&parts);
        }

        if let Some(duration) = &self.duration {
            event.duration = if whole_day {
                duration_from_days_entry(duration)
            } else {
                duration_from_time_entry(duration)
            };
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let store_dir = cli.store_dir.clone().unwrap_or_else(FileStore::default_dir);
    tracing::debug!(store = %store_dir.display(), "opening store");
    let mut session =
        Session::load(FileStore::open(store_dir)).context("Failed to load the cached batch")?;

    match cli.command {
        Commands::Import { input } => {
            let json = read_input(input.as_deref())?;
            let template = parse_template(&json).context("Failed to parse template")?;
            let count = template.events.len();
            session
                .import_template(template)
                .context("Failed to store imported events")?;
            println!("Imported {} event(s)", count);
        }
        Commands::Config {
            start_date,
            clear_start_date,
            batch_name,
            template_name,
        } => {
            let mut config = session.batch_config().clone();
            let changed = start_date.is_some()
                || clear_start_date
                || batch_name.is_some()
                || template_name.is_some();

            if let Some(text) = start_date {
                let parsed = StartDate::parse(&text);
                if !parsed.is_valid() {
                    tracing::warn!(input = %text, "start date is not a recognised date");
                }
                config = config.with_start_date(Some(parsed));
            }
            if clear_start_date {
                config = config.with_start_date(None);
            }
            if let Some(name) = batch_name {
                config = config.with_batch_name(name);
            }
            if let Some(name) = template_name {
                config = config.with_template_name(name);
            }

            if changed {
                session
                    .set_batch_config(config)
                    .context("Failed to store batch configuration")?;
            }
            print_config(session.batch_config())?;
        }
        Commands::Add {
            summary,
            description,
            whole_day,
            excluded,
            timing,
        } => {
            let mut event =
                Event::with_defaults(&EventDefaults::starting_at_hour(cli.default_start_hour));
            event.summary = summary;
            event.description = description;
            event.included = !excluded;
            event.set_whole_day_event(whole_day);
            timing.apply(&mut event);

            let id = event.id.clone();
            session.add_event(event).context("Failed to store event")?;
            println!("{}", id);
        }
        Commands::Edit {
            id,
            summary,
            description,
            whole_day,
            timing,
        } => {
            let mut event = find(&session, &id)?;
            if let Some(summary) = summary {
                event.summary = summary;
            }
            if let Some(description) = description {
                event.description = description;
            }
            if let Some(whole_day) = whole_day {
                event.set_whole_day_event(whole_day);
            }
            timing.apply(&mut event);
            session.update_event(event).context("Failed to store event")?;
        }
        Commands::Toggle { id } => {
            let mut event = find(&session, &id)?;
            event.included = !event.included;
            let included = event.included;
            session.update_event(event).context("Failed to store event")?;
            println!("{} {}", id, if included { "included" } else { "excluded" });
        }
        Commands::Remove { id } => {
            if !session.remove_event(&id).context("Failed to store events")? {
                bail!("No event with id '{}'", id);
            }
        }
        Commands::Sort => {
            session.sort_events().context("Failed to store events")?;
        }
        Commands::List { json } => {
            if json {
                let pretty = serde_json::to_string_pretty(session.events())?;
                println!("{}", pretty);
            } else {
                for event in session.events() {
                    println!("{}", list_line(session.batch_config(), event));
                }
            }
        }
        Commands::Export { output, out_dir } => {
            let ics = session
                .export_ics()
                .context("Failed to generate calendar")?;
            let path = match out_dir {
                Some(dir) => Some(dir.join(session.export_file_name()?)),
                None => output.map(PathBuf::from),
            };
            write_output(path.as_deref(), &ics)?;
        }
        Commands::SaveTemplate { output, out_dir } => {
            let template = session.export_template();
            let json = template.to_json().context("Failed to serialize template")?;
            let path = match out_dir {
                Some(dir) => Some(dir.join(template_file_name(&template.template_name))),
                None => output.map(PathBuf::from),
            };
            write_output(path.as_deref(), &json)?;
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn find<S: calendar_batch::KeyValueStore>(session: &Session<S>, id: &str) -> Result<Event> {
    match calendar_batch::events::find_event(session.events(), id) {
        Some(event) => Ok(event.clone()),
        None => bail!("No event with id '{}'", id),
    }
}

fn print_config(config: &BatchConfig) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(&config.to_json()?)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// One table row: inclusion mark, id, offset, duration, summary and, when the
/// batch has a start date, the resolved start.
fn list_line(config: &BatchConfig, event: &Event) -> String {
    let mark = if event.included { "[x]" } else { "[ ]" };
    let parts = event.start_offset_parts();
    let (time, duration) = if event.is_whole_day_event {
        ("all day".to_string(), format!("{}d", event.duration_entry_text()))
    } else {
        (parts.time.clone(), event.duration_entry_text())
    };

    let mut line = format!(
        "{} {}  +{}w {}d {}  {}  {}",
        mark, event.id, parts.weeks, parts.days, time, duration, event.summary
    );
    if let Some(start) = display_start(config, event) {
        line.push_str(&format!("  ({})", start));
    }
    line
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
