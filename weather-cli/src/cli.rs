use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};

use weather_core::{
    Config, Coordinates, DateRange, ExportFormat, ExportedDocument, NewSearch, Store, WeatherService, export_as,
    provider::provider_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookups with a local search history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current weather and the 5-day forecast for a location.
    Show {
        /// City name, US zip code, or "lat,lon".
        location: String,

        /// First day of a historical range (YYYY-MM-DD).
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Last day of a historical range (YYYY-MM-DD).
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Show weather at explicit coordinates, labelled by the nearest place.
    Here {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Manage saved searches.
    #[command(subcommand)]
    History(HistoryCommand),

    /// List the weather snapshots recorded for a search.
    Snapshots {
        search_id: i64,
    },

    /// Export saved searches as json, xml, csv or markdown.
    Export {
        format: ExportFormat,

        /// Export only this search's snapshots.
        #[arg(long)]
        search_id: Option<i64>,

        /// Destination file, or "-" for stdout. Defaults to the suggested file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List saved searches, newest first.
    List,

    /// Show one search with its snapshots.
    Show { id: i64 },

    /// Change the label of a saved search.
    Rename { id: i64, location: String },

    /// Delete a search and its snapshots.
    Delete { id: i64 },

    /// Fetch fresh weather for a saved search.
    Reload { id: i64 },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, from, to } => {
                let service = weather_service()?;
                match (from, to) {
                    (Some(start), Some(end)) => {
                        let report = service.search_range(&location, DateRange { start, end }).await?;
                        print!("{}", output::range_report(&report));
                    }
                    _ => {
                        let report = service.search(&location).await?;
                        print!("{}", output::lookup_report(&report));
                    }
                }
                Ok(())
            }
            Command::Here { lat, lon } => {
                let report = weather_service()?.lookup_position(Coordinates::new(lat, lon)).await?;
                print!("{}", output::lookup_report(&report));
                Ok(())
            }
            Command::History(cmd) => history(cmd).await,
            Command::Snapshots { search_id } => {
                let store = open_store(&Config::load()?)?;
                if store.get_search(search_id)?.is_none() {
                    bail!("Search {search_id} not found");
                }
                print!("{}", output::snapshot_table(&store.snapshots_for_search(search_id)?));
                Ok(())
            }
            Command::Export { format, search_id, output } => export(format, search_id, output),
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    let path = config.save()?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn history(cmd: HistoryCommand) -> Result<()> {
    match cmd {
        HistoryCommand::List => {
            let store = open_store(&Config::load()?)?;
            print!("{}", output::search_table(&store.list_searches()?));
        }
        HistoryCommand::Show { id } => {
            let store = open_store(&Config::load()?)?;
            let search = store.get_search(id)?.with_context(|| format!("Search {id} not found"))?;
            print!("{}", output::search_table(std::slice::from_ref(&search)));
            println!();
            print!("{}", output::snapshot_table(&store.snapshots_for_search(id)?));
        }
        HistoryCommand::Rename { id, location } => {
            let store = open_store(&Config::load()?)?;
            let search = store.get_search(id)?.with_context(|| format!("Search {id} not found"))?;
            let updated = store.update_search(
                id,
                &NewSearch { location, latitude: search.latitude, longitude: search.longitude },
            )?;
            println!("Renamed search {} to \"{}\"", updated.id, updated.location);
        }
        HistoryCommand::Delete { id } => {
            open_store(&Config::load()?)?.delete_search(id)?;
            println!("Search {id} deleted");
        }
        HistoryCommand::Reload { id } => {
            let report = weather_service()?.reload(id).await?;
            print!("{}", output::lookup_report(&report));
        }
    }
    Ok(())
}

fn export(format: ExportFormat, search_id: Option<i64>, path: Option<PathBuf>) -> Result<()> {
    let store = open_store(&Config::load()?)?;
    let doc = render_export(&store, format, search_id)?;

    let dest = path.unwrap_or_else(|| PathBuf::from(&doc.filename));
    if write_export(&doc, &dest, &mut std::io::stdout().lock())? {
        println!("Exported {format} to {}", dest.display());
    }
    Ok(())
}

fn render_export(store: &Store, format: ExportFormat, search_id: Option<i64>) -> Result<ExportedDocument> {
    let envelope = store.export_envelope(search_id)?;
    Ok(export_as(&envelope, format)?)
}

/// Write the document to `dest`, or verbatim to `stdout` when `dest` is "-".
/// Returns whether a file was written.
fn write_export(doc: &ExportedDocument, dest: &Path, stdout: &mut impl Write) -> Result<bool> {
    if dest.as_os_str() == "-" {
        stdout.write_all(doc.content.as_bytes()).context("Failed to write export to stdout")?;
        stdout.flush()?;
        return Ok(false);
    }

    fs::write(dest, &doc.content).with_context(|| format!("Failed to write export to {}", dest.display()))?;
    tracing::debug!(path = %dest.display(), bytes = doc.content.len(), "wrote export");
    Ok(true)
}

fn open_store(config: &Config) -> Result<Store> {
    let path = config.database_path()?;
    tracing::debug!(path = %path.display(), "opening weather database");
    Store::open(&path).with_context(|| format!("Failed to open database at {}", path.display()))
}

fn weather_service() -> Result<WeatherService> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let store = open_store(&config)?;
    Ok(WeatherService::new(Arc::from(provider), Arc::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_accepts_a_complete_range() {
        let cli = Cli::try_parse_from(["weather", "show", "London", "--from", "2024-04-01", "--to", "2024-04-03"])
            .unwrap();

        match cli.command {
            Command::Show { location, from, to } => {
                assert_eq!(location, "London");
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 4, 1));
                assert_eq!(to, NaiveDate::from_ymd_opt(2024, 4, 3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_rejects_half_a_range() {
        assert!(Cli::try_parse_from(["weather", "show", "London", "--from", "2024-04-01"]).is_err());
    }

    #[test]
    fn here_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["weather", "here", "--lat", "-33.87", "--lon", "151.21"]).unwrap();

        assert!(matches!(cli.command, Command::Here { lat, lon } if lat == -33.87 && lon == 151.21));
    }

    #[test]
    fn export_format_is_parsed_case_insensitively() {
        let cli = Cli::try_parse_from(["weather", "export", "MD", "--search-id", "3"]).unwrap();

        match cli.command {
            Command::Export { format, search_id, output } => {
                assert_eq!(format, ExportFormat::Markdown);
                assert_eq!(search_id, Some(3));
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["weather", "export", "yaml"]).is_err());
    }

    #[test]
    fn history_subcommands_parse() {
        let cli = Cli::try_parse_from(["weather", "history", "rename", "4", "Home"]).unwrap();

        assert!(matches!(
            cli.command,
            Command::History(HistoryCommand::Rename { id: 4, ref location }) if location == "Home"
        ));
    }

    fn stored_export(format: ExportFormat) -> ExportedDocument {
        let store = Store::open_in_memory().unwrap();
        store
            .create_search(&NewSearch { location: "Lyon".to_string(), latitude: 45.76, longitude: 4.84 })
            .unwrap();
        render_export(&store, format, None).unwrap()
    }

    #[test]
    fn dash_writes_export_verbatim_to_stdout() {
        let doc = stored_export(ExportFormat::Csv);
        let mut stdout = Vec::new();

        let wrote_file = write_export(&doc, Path::new("-"), &mut stdout).unwrap();

        assert!(!wrote_file);
        assert_eq!(stdout, doc.content.as_bytes());
        assert!(!doc.content.ends_with('\n'));
    }

    #[test]
    fn export_path_receives_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.md");
        let doc = stored_export(ExportFormat::Markdown);
        let mut stdout = Vec::new();

        let wrote_file = write_export(&doc, &dest, &mut stdout).unwrap();

        assert!(wrote_file);
        assert!(stdout.is_empty());
        assert_eq!(fs::read_to_string(&dest).unwrap(), doc.content);
    }
}
