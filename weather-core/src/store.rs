//! SQLite persistence for searches and their weather snapshots.
//!
//! One connection is opened at startup and shared behind a mutex. Snapshots
//! reference their search with `ON DELETE CASCADE`, so deleting a search
//! removes its snapshots as well.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use std::path::Path;

use crate::model::{
    ExportEnvelope, NewSearch, SearchRecord, SearchWithWeather, SnapshotFields, WeatherSnapshot,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Search {0} not found")]
    SearchNotFound(i64),

    #[error("Weather data {0} not found")]
    SnapshotNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const SEARCH_COLUMNS: &str = "id, location, latitude, longitude, created_at";
const SNAPSHOT_COLUMNS: &str = "id, search_id, temperature, feels_like, humidity, wind_speed, \
                                description, icon, date_start, date_end, created_at";

pub struct Store {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create the database file and its schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened weather database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS searches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS weather_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                search_id INTEGER NOT NULL,
                temperature REAL NOT NULL,
                feels_like REAL,
                humidity INTEGER,
                wind_speed REAL,
                description TEXT,
                icon TEXT,
                date_start TEXT,
                date_end TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (search_id) REFERENCES searches (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_weather_data_search ON weather_data(search_id);
            "#,
        )?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn create_search(&self, new: &NewSearch) -> StoreResult<SearchRecord> {
        let created_at = now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO searches (location, latitude, longitude, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![new.location, new.latitude, new.longitude, encode_timestamp(&created_at)],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, location = %new.location, "created search");

        Ok(SearchRecord {
            id,
            location: new.location.clone(),
            latitude: new.latitude,
            longitude: new.longitude,
            created_at,
        })
    }

    /// All searches, newest first.
    pub fn list_searches(&self) -> StoreResult<Vec<SearchRecord>> {
        let conn = self.conn.lock();
        all_searches(&conn)
    }

    pub fn get_search(&self, id: i64) -> StoreResult<Option<SearchRecord>> {
        let conn = self.conn.lock();
        search_by_id(&conn, id)
    }

    pub fn update_search(&self, id: i64, new: &NewSearch) -> StoreResult<SearchRecord> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE searches SET location = ?1, latitude = ?2, longitude = ?3 WHERE id = ?4",
            params![new.location, new.latitude, new.longitude, id],
        )?;
        if changed == 0 {
            return Err(StoreError::SearchNotFound(id));
        }

        search_by_id(&conn, id)?.ok_or(StoreError::SearchNotFound(id))
    }

    /// Delete a search and, through the foreign key, its snapshots.
    pub fn delete_search(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM searches WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::SearchNotFound(id));
        }

        tracing::debug!(id, "deleted search");
        Ok(())
    }

    pub fn create_snapshot(&self, search_id: i64, fields: &SnapshotFields) -> StoreResult<WeatherSnapshot> {
        let created_at = now();
        let conn = self.conn.lock();
        if search_by_id(&conn, search_id)?.is_none() {
            return Err(StoreError::SearchNotFound(search_id));
        }

        conn.execute(
            "INSERT INTO weather_data
             (search_id, temperature, feels_like, humidity, wind_speed, description, icon, date_start, date_end, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                search_id,
                fields.temperature,
                fields.feels_like,
                fields.humidity,
                fields.wind_speed,
                fields.description,
                fields.icon,
                fields.date_start.map(encode_date),
                fields.date_end.map(encode_date),
                encode_timestamp(&created_at),
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, search_id, "created weather snapshot");

        Ok(WeatherSnapshot {
            id,
            search_id,
            temperature: fields.temperature,
            feels_like: fields.feels_like,
            humidity: fields.humidity,
            wind_speed: fields.wind_speed,
            description: fields.description.clone(),
            icon: fields.icon.clone(),
            date_start: fields.date_start,
            date_end: fields.date_end,
            created_at,
        })
    }

    /// Snapshots of one search, newest first. Unknown searches have none.
    pub fn snapshots_for_search(&self, search_id: i64) -> StoreResult<Vec<WeatherSnapshot>> {
        let conn = self.conn.lock();
        snapshots_of(&conn, search_id)
    }

    pub fn get_snapshot(&self, id: i64) -> StoreResult<Option<WeatherSnapshot>> {
        let conn = self.conn.lock();
        snapshot_by_id(&conn, id)
    }

    pub fn update_snapshot(&self, id: i64, fields: &SnapshotFields) -> StoreResult<WeatherSnapshot> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE weather_data
             SET temperature = ?1, feels_like = ?2, humidity = ?3, wind_speed = ?4,
                 description = ?5, icon = ?6, date_start = ?7, date_end = ?8
             WHERE id = ?9",
            params![
                fields.temperature,
                fields.feels_like,
                fields.humidity,
                fields.wind_speed,
                fields.description,
                fields.icon,
                fields.date_start.map(encode_date),
                fields.date_end.map(encode_date),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::SnapshotNotFound(id));
        }

        snapshot_by_id(&conn, id)?.ok_or(StoreError::SnapshotNotFound(id))
    }

    pub fn delete_snapshot(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM weather_data WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::SnapshotNotFound(id));
        }
        Ok(())
    }

    /// Gather the data to export: one search's snapshots, or every search with its snapshots.
    pub fn export_envelope(&self, search_id: Option<i64>) -> StoreResult<ExportEnvelope> {
        let conn = self.conn.lock();

        if let Some(id) = search_id {
            return Ok(ExportEnvelope::Single { weather_data: snapshots_of(&conn, id)? });
        }

        let searches = all_searches(&conn)?
            .into_iter()
            .map(|search| {
                let weather_data = snapshots_of(&conn, search.id)?;
                Ok(SearchWithWeather { search, weather_data })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(ExportEnvelope::All { searches })
    }
}

fn all_searches(conn: &Connection) -> StoreResult<Vec<SearchRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SEARCH_COLUMNS} FROM searches ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], row_to_search)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn search_by_id(conn: &Connection, id: i64) -> StoreResult<Option<SearchRecord>> {
    Ok(conn
        .query_row(
            &format!("SELECT {SEARCH_COLUMNS} FROM searches WHERE id = ?1"),
            params![id],
            row_to_search,
        )
        .optional()?)
}

fn snapshots_of(conn: &Connection, search_id: i64) -> StoreResult<Vec<WeatherSnapshot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM weather_data WHERE search_id = ?1 ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![search_id], row_to_snapshot)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn snapshot_by_id(conn: &Connection, id: i64) -> StoreResult<Option<WeatherSnapshot>> {
    Ok(conn
        .query_row(
            &format!("SELECT {SNAPSHOT_COLUMNS} FROM weather_data WHERE id = ?1"),
            params![id],
            row_to_snapshot,
        )
        .optional()?)
}

fn row_to_search(row: &Row) -> rusqlite::Result<SearchRecord> {
    Ok(SearchRecord {
        id: row.get(0)?,
        location: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        created_at: decode_timestamp(4, row.get(4)?)?,
    })
}

fn row_to_snapshot(row: &Row) -> rusqlite::Result<WeatherSnapshot> {
    Ok(WeatherSnapshot {
        id: row.get(0)?,
        search_id: row.get(1)?,
        temperature: row.get(2)?,
        feels_like: row.get(3)?,
        humidity: row.get(4)?,
        wind_speed: row.get(5)?,
        description: row.get(6)?,
        icon: row.get(7)?,
        date_start: decode_date(8, row.get(8)?)?,
        date_end: decode_date(9, row.get(9)?)?,
        created_at: decode_timestamp(10, row.get(10)?)?,
    })
}

/// Microsecond precision keeps stored text fixed-width, so it sorts chronologically.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn decode_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn decode_date(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn london() -> NewSearch {
        NewSearch { location: "London".to_string(), latitude: 51.5074, longitude: -0.1278 }
    }

    fn fields(temperature: f64, description: &str) -> SnapshotFields {
        SnapshotFields {
            temperature,
            feels_like: Some(temperature - 1.0),
            humidity: Some(70),
            wind_speed: Some(5.0),
            description: Some(description.to_string()),
            icon: Some("04d".to_string()),
            date_start: None,
            date_end: None,
        }
    }

    #[test]
    fn create_and_get_search() {
        let store = Store::open_in_memory().unwrap();

        let created = store.create_search(&london()).unwrap();
        let fetched = store.get_search(created.id).unwrap().expect("search exists");

        assert_eq!(fetched, created);
        assert_eq!(fetched.location, "London");
    }

    #[test]
    fn ids_are_monotonic_and_list_is_newest_first() {
        let store = Store::open_in_memory().unwrap();

        let a = store.create_search(&london()).unwrap();
        let b = store
            .create_search(&NewSearch { location: "Tokyo".into(), latitude: 35.67, longitude: 139.65 })
            .unwrap();

        assert!(b.id > a.id);
        let ids: Vec<i64> = store.list_searches().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn update_search_replaces_fields() {
        let store = Store::open_in_memory().unwrap();
        let created = store.create_search(&london()).unwrap();

        let updated = store
            .update_search(created.id, &NewSearch { location: "London, GB".into(), latitude: 51.5, longitude: -0.12 })
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.location, "London, GB");
        assert_eq!(updated.latitude, 51.5);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn missing_rows_are_reported() {
        let store = Store::open_in_memory().unwrap();

        assert!(store.get_search(42).unwrap().is_none());
        assert!(matches!(store.update_search(42, &london()), Err(StoreError::SearchNotFound(42))));
        assert!(matches!(store.delete_search(42), Err(StoreError::SearchNotFound(42))));
        assert!(matches!(store.update_snapshot(7, &fields(1.0, "x")), Err(StoreError::SnapshotNotFound(7))));
        assert!(matches!(store.delete_snapshot(7), Err(StoreError::SnapshotNotFound(7))));
    }

    #[test]
    fn snapshot_requires_existing_search() {
        let store = Store::open_in_memory().unwrap();

        let err = store.create_snapshot(99, &fields(20.0, "clear sky")).unwrap_err();

        assert!(matches!(err, StoreError::SearchNotFound(99)));
    }

    #[test]
    fn snapshots_roundtrip_including_date_range() {
        let store = Store::open_in_memory().unwrap();
        let search = store.create_search(&london()).unwrap();

        let ranged = SnapshotFields {
            date_start: NaiveDate::from_ymd_opt(2024, 4, 1),
            date_end: NaiveDate::from_ymd_opt(2024, 4, 5),
            ..fields(11.0, "overcast clouds")
        };
        let created = store.create_snapshot(search.id, &ranged).unwrap();

        let fetched = store.get_snapshot(created.id).unwrap().expect("snapshot exists");
        assert_eq!(fetched, created);
        assert_eq!(fetched.date_start, NaiveDate::from_ymd_opt(2024, 4, 1));
    }

    #[test]
    fn update_snapshot_changes_values() {
        let store = Store::open_in_memory().unwrap();
        let search = store.create_search(&london()).unwrap();
        let created = store.create_snapshot(search.id, &fields(10.0, "mist")).unwrap();

        let updated = store.update_snapshot(created.id, &fields(12.5, "fog")).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.search_id, search.id);
        assert_eq!(updated.temperature, 12.5);
        assert_eq!(updated.description.as_deref(), Some("fog"));
    }

    #[test]
    fn deleting_search_cascades_to_snapshots() {
        let store = Store::open_in_memory().unwrap();
        let search = store.create_search(&london()).unwrap();
        let snap = store.create_snapshot(search.id, &fields(10.0, "mist")).unwrap();
        store.create_snapshot(search.id, &fields(11.0, "haze")).unwrap();

        store.delete_search(search.id).unwrap();

        assert!(store.get_search(search.id).unwrap().is_none());
        assert!(store.get_snapshot(snap.id).unwrap().is_none());
        assert!(store.snapshots_for_search(search.id).unwrap().is_empty());
    }

    #[test]
    fn export_envelope_shapes() {
        let store = Store::open_in_memory().unwrap();
        let empty = store.create_search(&london()).unwrap();
        let full = store
            .create_search(&NewSearch { location: "Paris".into(), latitude: 48.85, longitude: 2.35 })
            .unwrap();
        for t in [1.0, 2.0, 3.0] {
            store.create_snapshot(full.id, &fields(t, "clouds")).unwrap();
        }

        match store.export_envelope(Some(full.id)).unwrap() {
            ExportEnvelope::Single { weather_data } => assert_eq!(weather_data.len(), 3),
            other => panic!("unexpected envelope: {other:?}"),
        }

        match store.export_envelope(None).unwrap() {
            ExportEnvelope::All { searches } => {
                assert_eq!(searches.len(), 2);
                let by_id = |id| searches.iter().find(|s| s.search.id == id).expect("search exported");
                assert!(by_id(empty.id).weather_data.is_empty());
                assert_eq!(by_id(full.id).weather_data.len(), 3);
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn file_backed_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather-data.sqlite");

        let id = {
            let store = Store::open(&path).unwrap();
            store.create_search(&london()).unwrap().id
        };

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.get_search(id).unwrap().map(|s| s.location), Some("London".to_string()));
    }
}
