//! Rendering of stored searches and snapshots into downloadable documents.
//!
//! Every format works from the same [`ExportEnvelope`]. The envelope shape
//! decides the layout: one search's snapshots become a single table, all
//! searches become one section (or row group) per search.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::{convert::TryFrom, str::FromStr};

use crate::model::{ExportEnvelope, WeatherSnapshot};

mod csv;
mod markdown;
mod xml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Xml,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
        }
    }

    pub const fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Json, ExportFormat::Xml, ExportFormat::Csv, ExportFormat::Markdown]
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Xml => "application/xml",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Markdown => "text/markdown",
        }
    }

    /// Suggested download name, e.g. `weather-data.csv`.
    pub fn filename(&self) -> String {
        let ext = match self {
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        };
        format!("weather-data.{ext}")
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = ExportError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "xml" => Ok(ExportFormat::Xml),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(ExportError::UnsupportedFormat(value.to_string())),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::try_from(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Unsupported export format '{0}'. Supported formats: json, xml, csv, markdown.")]
    UnsupportedFormat(String),

    #[error("Failed to serialize export data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write XML: {0}")]
    Xml(String),
}

/// Rendered export plus the values a delivery layer needs for its headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub content: String,
    pub mime_type: &'static str,
    pub filename: String,
}

/// Render `envelope` in the requested format.
pub fn export_as(envelope: &ExportEnvelope, format: ExportFormat) -> Result<ExportedDocument, ExportError> {
    let content = match format {
        ExportFormat::Json => serde_json::to_string_pretty(envelope)?,
        ExportFormat::Xml => xml::render(&serde_json::to_value(envelope)?)?,
        ExportFormat::Csv => csv::render(envelope)?,
        ExportFormat::Markdown => markdown::render(envelope)?,
    };

    tracing::debug!(format = %format, bytes = content.len(), "rendered export");

    Ok(ExportedDocument { content, mime_type: format.mime_type(), filename: format.filename() })
}

/// Parse a format name and render in one step.
pub fn export_named(envelope: &ExportEnvelope, format: &str) -> Result<ExportedDocument, ExportError> {
    export_as(envelope, ExportFormat::try_from(format)?)
}

/// Snapshots as ordered field maps, so table columns follow the record layout.
fn snapshot_rows(snapshots: &[WeatherSnapshot]) -> Result<Vec<Map<String, Value>>, ExportError> {
    snapshots
        .iter()
        .map(|s| match serde_json::to_value(s)? {
            Value::Object(map) => Ok(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Ok(map)
            }
        })
        .collect()
}

/// Plain text of a scalar JSON value; null becomes empty.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Same rendering serde uses for timestamps in the JSON export.
fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!(ExportFormat::try_from("JSON").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::try_from("Xml").unwrap(), ExportFormat::Xml);
        assert_eq!(ExportFormat::try_from("csv").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::try_from("MarkDown").unwrap(), ExportFormat::Markdown);
        assert_eq!(ExportFormat::try_from("md").unwrap(), ExportFormat::Markdown);

        for format in ExportFormat::all() {
            assert_eq!(ExportFormat::from_str(format.as_str()).unwrap(), *format);
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let envelope = ExportEnvelope::Single { weather_data: vec![snapshot(1, 1, "clear sky")] };

        let err = export_named(&envelope, "yaml").unwrap_err();

        assert!(matches!(err, ExportError::UnsupportedFormat(ref f) if f == "yaml"));
        assert!(err.to_string().contains("Unsupported export format"));
    }

    #[test]
    fn document_carries_delivery_metadata() {
        let envelope = ExportEnvelope::All { searches: vec![] };

        let doc = export_as(&envelope, ExportFormat::Markdown).unwrap();
        assert_eq!(doc.mime_type, "text/markdown");
        assert_eq!(doc.filename, "weather-data.md");

        let doc = export_as(&envelope, ExportFormat::Csv).unwrap();
        assert_eq!(doc.mime_type, "text/csv");
        assert_eq!(doc.filename, "weather-data.csv");
    }

    #[test]
    fn json_export_parses_back_to_the_same_envelope() {
        let envelope = ExportEnvelope::All {
            searches: vec![
                search(1, "London, GB", vec![]),
                search(
                    2,
                    "Paris, FR",
                    vec![snapshot(10, 2, "light rain"), snapshot(11, 2, "a|b"), ranged_snapshot(12, 2)],
                ),
            ],
        };

        let doc = export_as(&envelope, ExportFormat::Json).unwrap();
        assert_eq!(doc.mime_type, "application/json");

        let parsed: ExportEnvelope = serde_json::from_str(&doc.content).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn json_export_uses_envelope_keys() {
        let single = ExportEnvelope::Single { weather_data: vec![snapshot(1, 7, "mist")] };
        let doc = export_as(&single, ExportFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&doc.content).unwrap();

        assert_eq!(value["weatherData"][0]["search_id"], 7);
        assert_eq!(value["weatherData"][0]["date_start"], Value::Null);

        let parsed: ExportEnvelope = serde_json::from_str(&doc.content).unwrap();
        assert_eq!(parsed, single);
    }
}
