use crate::model::{ExportEnvelope, SearchWithWeather};

use super::{ExportError, scalar_text, snapshot_rows, timestamp_text};

pub(super) const NO_WEATHER_DATA: &str = "No weather data found";
pub(super) const NO_SEARCHES: &str = "No searches found";

const ALL_SEARCHES_HEADER: &str = "id,location,latitude,longitude,temperature,humidity,description,date";

pub(super) fn render(envelope: &ExportEnvelope) -> Result<String, ExportError> {
    match envelope {
        ExportEnvelope::Single { weather_data } => {
            let rows = snapshot_rows(weather_data)?;
            let Some(first) = rows.first() else {
                return Ok(NO_WEATHER_DATA.to_string());
            };

            let header: Vec<&String> = first.keys().collect();
            let mut lines = vec![header.iter().map(|k| field(k)).collect::<Vec<_>>().join(",")];

            for row in &rows {
                let cells: Vec<String> = header
                    .iter()
                    .map(|key| field(&row.get(key.as_str()).map(scalar_text).unwrap_or_default()))
                    .collect();
                lines.push(cells.join(","));
            }

            Ok(lines.join("\n"))
        }
        ExportEnvelope::All { searches } => {
            if searches.is_empty() {
                return Ok(NO_SEARCHES.to_string());
            }

            let mut lines = vec![ALL_SEARCHES_HEADER.to_string()];
            for search in searches {
                lines.extend(search_rows(search));
            }

            Ok(lines.join("\n"))
        }
    }
}

fn search_rows(entry: &SearchWithWeather) -> Vec<String> {
    let search = &entry.search;
    let prefix = format!(
        "{},{},{},{}",
        search.id,
        quoted(&search.location),
        search.latitude,
        search.longitude
    );

    if entry.weather_data.is_empty() {
        return vec![format!("{prefix},,,,")];
    }

    entry
        .weather_data
        .iter()
        .map(|w| {
            format!(
                "{prefix},{},{},{},{}",
                w.temperature,
                w.humidity.map(|h| h.to_string()).unwrap_or_default(),
                quoted(w.description.as_deref().unwrap_or_default()),
                timestamp_text(&w.created_at),
            )
        })
        .collect()
}

/// Quote only when the value would otherwise break the row.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) { quoted(value) } else { value.to_string() }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
