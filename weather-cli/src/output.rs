//! Plain-text rendering of lookups and stored records.

use weather_core::{
    DailyBucket, LookupReport, RangeReport, SearchRecord, WeatherSample, WeatherSnapshot,
};

pub fn lookup_report(report: &LookupReport) -> String {
    let current = &report.current;
    let mut out = format!("Weather for {} ({})\n", current.label(), current.coordinates);
    out.push_str(&sample_block(&current.sample));

    if !report.forecast.is_empty() {
        out.push_str("\nForecast\n");
        for day in &report.forecast {
            out.push_str(&day_line(day));
        }
    }

    if let Some(search) = &report.search {
        out.push_str(&format!("\nSaved as search #{}\n", search.id));
    }
    out
}

pub fn range_report(report: &RangeReport) -> String {
    let mut out = format!(
        "Weather at {} from {} to {}\n",
        report.coordinates, report.range.start, report.range.end
    );
    for sample in &report.samples {
        out.push_str(&format!(
            "  {}  {:.1}°C  {}\n",
            sample.timestamp.date_naive(),
            sample.temperature,
            sample.condition
        ));
    }
    out
}

fn sample_block(sample: &WeatherSample) -> String {
    format!(
        "  {}\n  Temperature: {:.1}°C (feels like {:.1}°C)\n  Humidity:    {}%\n  Wind:        {:.1} m/s\n",
        sample.condition, sample.temperature, sample.feels_like, sample.humidity, sample.wind_speed
    )
}

fn day_line(day: &DailyBucket) -> String {
    format!(
        "  {}  {:>5.1}°C / {:>5.1}°C  {}\n",
        day.date.format("%a %b %d"),
        day.temperature_max,
        day.temperature_min,
        day.representative.condition
    )
}

pub fn search_table(searches: &[SearchRecord]) -> String {
    if searches.is_empty() {
        return "No saved searches.\n".to_string();
    }

    let mut out = format!("{:>5}  {:<30}  {:>10}  {:>11}  {}\n", "ID", "LOCATION", "LAT", "LON", "CREATED");
    for s in searches {
        out.push_str(&format!(
            "{:>5}  {:<30}  {:>10.4}  {:>11.4}  {}\n",
            s.id,
            s.location,
            s.latitude,
            s.longitude,
            s.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

pub fn snapshot_table(snapshots: &[WeatherSnapshot]) -> String {
    if snapshots.is_empty() {
        return "No weather data recorded.\n".to_string();
    }

    let mut out = format!("{:>5}  {:>7}  {:>8}  {:<24}  {}\n", "ID", "TEMP", "HUMIDITY", "DESCRIPTION", "RECORDED");
    for s in snapshots {
        let humidity = s.humidity.map(|h| format!("{h}%")).unwrap_or_else(|| "-".to_string());
        let recorded = match (s.date_start, s.date_end) {
            (Some(start), Some(end)) => format!("{start} .. {end}"),
            _ => s.created_at.format("%Y-%m-%d %H:%M").to_string(),
        };
        out.push_str(&format!(
            "{:>5}  {:>7.1}  {:>8}  {:<24}  {}\n",
            s.id,
            s.temperature,
            humidity,
            s.description.as_deref().unwrap_or("-"),
            recorded
        ));
    }
    out
}
