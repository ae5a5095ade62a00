//! Grouping of 3-hour forecast samples into daily summaries.

use chrono::{NaiveDate, Timelike};
use serde::Serialize;

use crate::model::WeatherSample;

const MIDDAY_HOUR: i64 = 12;

/// Forecast samples sharing one UTC calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub samples: Vec<WeatherSample>,
    /// Sample whose hour is closest to noon; the earliest one wins ties.
    pub representative: WeatherSample,
    /// Lowest reported `temperature_min` of the day.
    pub temperature_min: f64,
    /// Highest reported `temperature_max` of the day.
    pub temperature_max: f64,
}

impl DailyBucket {
    fn start(date: NaiveDate, sample: &WeatherSample) -> Self {
        Self {
            date,
            samples: vec![sample.clone()],
            representative: sample.clone(),
            temperature_min: sample.temperature_min,
            temperature_max: sample.temperature_max,
        }
    }

    fn push(&mut self, sample: &WeatherSample) {
        if noon_distance(sample) < noon_distance(&self.representative) {
            self.representative = sample.clone();
        }
        self.temperature_min = self.temperature_min.min(sample.temperature_min);
        self.temperature_max = self.temperature_max.max(sample.temperature_max);
        self.samples.push(sample.clone());
    }
}

/// Daily buckets keyed by date, in the order each date was first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DailyForecast {
    days: Vec<DailyBucket>,
}

impl DailyForecast {
    pub fn get(&self, date: NaiveDate) -> Option<&DailyBucket> {
        self.days.iter().find(|b| b.date == date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().map(|b| b.date)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyBucket> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn get_mut(&mut self, date: NaiveDate) -> Option<&mut DailyBucket> {
        self.days.iter_mut().find(|b| b.date == date)
    }
}

impl<'a> IntoIterator for &'a DailyForecast {
    type Item = &'a DailyBucket;
    type IntoIter = std::slice::Iter<'a, DailyBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

/// Group samples by UTC calendar date.
///
/// Input is expected in chronological order; bucket order follows the first
/// appearance of each date either way. An empty slice gives an empty result.
pub fn bucket_forecast(samples: &[WeatherSample]) -> DailyForecast {
    let mut forecast = DailyForecast::default();

    for sample in samples {
        let date = sample.timestamp.date_naive();
        match forecast.get_mut(date) {
            Some(bucket) => bucket.push(sample),
            None => forecast.days.push(DailyBucket::start(date, sample)),
        }
    }

    forecast
}

fn noon_distance(sample: &WeatherSample) -> i64 {
    (i64::from(sample.timestamp.hour()) - MIDDAY_HOUR).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid timestamp")
    }

    fn sample(ts: DateTime<Utc>, min: f64, max: f64) -> WeatherSample {
        WeatherSample {
            timestamp: ts,
            temperature: (min + max) / 2.0,
            temperature_min: min,
            temperature_max: max,
            feels_like: 0.0,
            humidity: 50,
            wind_speed: 1.0,
            condition: format!("sample at {}", ts.hour()),
            icon_id: "01d".to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn empty_input_gives_no_buckets() {
        let forecast = bucket_forecast(&[]);
        assert!(forecast.is_empty());
        assert_eq!(forecast.len(), 0);
    }

    #[test]
    fn groups_samples_by_utc_date() {
        let samples = vec![
            sample(at(2024, 3, 1, 15), 5.0, 9.0),
            sample(at(2024, 3, 1, 18), 4.0, 8.0),
            sample(at(2024, 3, 1, 21), 3.0, 6.0),
            sample(at(2024, 3, 2, 0), 2.0, 5.0),
            sample(at(2024, 3, 2, 3), 1.0, 4.0),
        ];

        let forecast = bucket_forecast(&samples);

        assert_eq!(forecast.len(), 2);
        assert_eq!(forecast.dates().collect::<Vec<_>>(), vec![date(2024, 3, 1), date(2024, 3, 2)]);

        let first = forecast.get(date(2024, 3, 1)).expect("first day");
        assert_eq!(first.samples.len(), 3);
        assert!(first.samples.iter().all(|s| s.timestamp.date_naive() == date(2024, 3, 1)));

        let second = forecast.get(date(2024, 3, 2)).expect("second day");
        assert_eq!(second.samples.len(), 2);
        assert!(second.samples.iter().all(|s| s.timestamp.date_naive() == date(2024, 3, 2)));
    }

    #[test]
    fn equal_distance_keeps_first_sample() {
        let samples = vec![sample(at(2024, 3, 1, 10), 1.0, 2.0), sample(at(2024, 3, 1, 14), 1.0, 2.0)];

        let forecast = bucket_forecast(&samples);
        let day = forecast.get(date(2024, 3, 1)).expect("bucket");

        assert_eq!(day.representative.timestamp.hour(), 10);
    }

    #[test]
    fn strictly_closer_sample_replaces_representative() {
        let samples = vec![
            sample(at(2024, 3, 1, 6), 1.0, 2.0),
            sample(at(2024, 3, 1, 9), 1.0, 2.0),
            sample(at(2024, 3, 1, 12), 1.0, 2.0),
            sample(at(2024, 3, 1, 15), 1.0, 2.0),
        ];

        let forecast = bucket_forecast(&samples);
        let day = forecast.get(date(2024, 3, 1)).expect("bucket");

        assert_eq!(day.representative.timestamp.hour(), 12);
    }

    #[test]
    fn midnight_only_bucket_still_has_representative() {
        let samples = vec![sample(at(2024, 3, 1, 0), -1.0, 3.0)];

        let forecast = bucket_forecast(&samples);
        let day = forecast.get(date(2024, 3, 1)).expect("bucket");

        assert_eq!(day.representative, samples[0]);
        assert_eq!(day.temperature_min, -1.0);
        assert_eq!(day.temperature_max, 3.0);
    }

    #[test]
    fn min_max_scan_every_sample() {
        let samples = vec![
            sample(at(2024, 3, 1, 9), 1.0, 10.0),
            sample(at(2024, 3, 1, 12), -3.0, 8.0),
            sample(at(2024, 3, 1, 15), 5.0, 12.0),
        ];

        let forecast = bucket_forecast(&samples);
        let day = forecast.get(date(2024, 3, 1)).expect("bucket");

        assert_eq!(day.representative.timestamp.hour(), 12);
        assert_eq!(day.temperature_min, -3.0);
        assert_eq!(day.temperature_max, 12.0);
    }

    #[test]
    fn bucket_order_follows_first_appearance() {
        let samples = vec![
            sample(at(2024, 3, 2, 12), 1.0, 2.0),
            sample(at(2024, 3, 1, 12), 1.0, 2.0),
            sample(at(2024, 3, 2, 15), 1.0, 2.0),
        ];

        let forecast = bucket_forecast(&samples);

        assert_eq!(forecast.dates().collect::<Vec<_>>(), vec![date(2024, 3, 2), date(2024, 3, 1)]);
        assert_eq!(forecast.get(date(2024, 3, 2)).map(|b| b.samples.len()), Some(2));
    }
}
