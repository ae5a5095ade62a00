use std::fmt::Write;

use serde_json::{Map, Value};

use crate::model::{ExportEnvelope, WeatherSnapshot};

use super::{ExportError, csv::NO_SEARCHES, csv::NO_WEATHER_DATA, scalar_text, snapshot_rows, timestamp_text};

const TITLE: &str = "# Weather Data Export\n\n";
const NO_LOCATION_DATA: &str = "No weather data available for this location.";

pub(super) fn render(envelope: &ExportEnvelope) -> Result<String, ExportError> {
    let mut md = String::from(TITLE);

    match envelope {
        ExportEnvelope::Single { weather_data } => {
            if weather_data.is_empty() {
                md.push_str(NO_WEATHER_DATA);
                return Ok(md);
            }
            write_table(&mut md, weather_data)?;
        }
        ExportEnvelope::All { searches } => {
            if searches.is_empty() {
                md.push_str(NO_SEARCHES);
                return Ok(md);
            }

            for entry in searches {
                let search = &entry.search;
                let _ = write!(
                    md,
                    "## {}\n\n- **ID**: {}\n- **Coordinates**: {}, {}\n- **Created At**: {}\n\n",
                    search.location,
                    search.id,
                    search.latitude,
                    search.longitude,
                    timestamp_text(&search.created_at),
                );

                if entry.weather_data.is_empty() {
                    md.push_str(NO_LOCATION_DATA);
                    md.push_str("\n\n");
                    continue;
                }

                md.push_str("### Weather Data\n\n");
                write_table(&mut md, &entry.weather_data)?;
                md.push('\n');
            }
        }
    }

    Ok(md)
}

fn write_table(md: &mut String, snapshots: &[WeatherSnapshot]) -> Result<(), ExportError> {
    let rows = snapshot_rows(snapshots)?;
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let header: Vec<&str> = first.keys().map(String::as_str).collect();

    write_row(md, header.iter().map(|h| h.to_string()));
    write_row(md, header.iter().map(|_| "---".to_string()));
    for row in &rows {
        write_row(md, header.iter().map(|key| cell(row, key)));
    }

    Ok(())
}

fn write_row(md: &mut String, cells: impl Iterator<Item = String>) {
    let cells: Vec<String> = cells.collect();
    let _ = writeln!(md, "| {} |", cells.join(" | "));
}

fn cell(row: &Map<String, Value>, key: &str) -> String {
    row.get(key).map(scalar_text).unwrap_or_default().replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures::*;

    #[test]
    fn single_search_renders_one_table() {
        let envelope = ExportEnvelope::Single { weather_data: vec![snapshot(1, 2, "clear sky")] };

        let md = render(&envelope).unwrap();
        let lines: Vec<&str> = md.lines().collect();

        assert_eq!(lines[0], "# Weather Data Export");
        assert_eq!(lines[1], "");
        assert_eq!(
            lines[2],
            "| id | search_id | temperature | feels_like | humidity | wind_speed | description | icon | date_start | date_end | created_at |"
        );
        assert_eq!(lines[3], "| --- | --- | --- | --- | --- | --- | --- | --- | --- | --- | --- |");
        assert_eq!(lines[4], "| 1 | 2 | 18.5 | 17.25 | 72 | 4.1 | clear sky | 10d |  |  | 2024-05-01T09:30:00Z |");
    }

    #[test]
    fn pipes_in_values_are_escaped() {
        let envelope = ExportEnvelope::Single { weather_data: vec![snapshot(1, 2, "a|b")] };

        let md = render(&envelope).unwrap();

        assert!(md.contains("| a\\|b |"));
    }

    #[test]
    fn empty_inputs_use_fallback_text() {
        let single = ExportEnvelope::Single { weather_data: vec![] };
        let all = ExportEnvelope::All { searches: vec![] };

        assert_eq!(render(&single).unwrap(), "# Weather Data Export\n\nNo weather data found");
        assert_eq!(render(&all).unwrap(), "# Weather Data Export\n\nNo searches found");
    }

    #[test]
    fn all_searches_render_section_per_search() {
        let envelope = ExportEnvelope::All {
            searches: vec![search(1, "Berlin, DE", vec![snapshot(4, 1, "haze")]), search(2, "Lima, PE", vec![])],
        };

        let md = render(&envelope).unwrap();

        assert!(md.contains(
            "## Berlin, DE\n\n- **ID**: 1\n- **Coordinates**: 51.5074, -0.1278\n- **Created At**: 2024-05-01T09:00:00Z\n\n### Weather Data\n\n| id |"
        ));
        assert!(md.contains("| 4 | 1 | 18.5 |"));
        assert!(md.contains("## Lima, PE\n\n- **ID**: 2\n"));
        assert!(md.ends_with("No weather data available for this location.\n\n"));
        assert_eq!(md.matches("### Weather Data").count(), 1);
    }
}
