//! Classification of free-text location input.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::Coordinates;

static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[-+]?([1-8]?\d(\.\d+)?|90(\.0+)?),\s*[-+]?(180(\.0+)?|((1[0-7]\d)|([1-9]?\d))(\.\d+)?)$",
    )
    .expect("coordinate pattern is valid")
});

static ZIP_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{5}(-\d{4})?$").expect("zip pattern is valid")
});

/// What the user typed, resolved to the lookup it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates(Coordinates),
    /// US postal code, optionally ZIP+4.
    ZipCode(String),
    PlaceName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Please enter a location")]
    Empty,
}

impl LocationQuery {
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(LocationError::Empty);
        }

        if COORDINATES.is_match(input) {
            let mut parts = input.split(',').map(|p| p.trim().parse::<f64>());
            if let (Some(Ok(lat)), Some(Ok(lon))) = (parts.next(), parts.next()) {
                return Ok(LocationQuery::Coordinates(Coordinates::new(lat, lon)));
            }
        }

        if ZIP_CODE.is_match(input) {
            return Ok(LocationQuery::ZipCode(input.to_string()));
        }

        Ok(LocationQuery::PlaceName(input.to_string()))
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationQuery::Coordinates(c) => write!(f, "{c}"),
            LocationQuery::ZipCode(zip) => f.write_str(zip),
            LocationQuery::PlaceName(name) => f.write_str(name),
        }
    }
}
