use serde::{Deserialize, Deserializer, Serialize};

/// Marker the Ergast dumps use for SQL NULL
const NULL_MARKER: &str = "\\N";

/// A racing venue (`circuits.csv`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_id: String,
    pub name: String,
    pub country: String,
    #[serde(default, deserialize_with = "null_marker")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lng: Option<f64>,
}

impl Circuit {
    /// Coordinates as (lon, lat), the canvas' x/y order
    pub fn coords(&self) -> Option<(f64, f64)> {
        Some((self.lng?, self.lat?))
    }
}

/// One year's event at a circuit (`races.csv`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub race_id: String,
    pub circuit_id: String,
    pub year: i32,
    #[serde(default, deserialize_with = "null_marker")]
    pub name: Option<String>,
}

/// A single driver's outcome in a race (`results.csv`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    pub race_id: String,
    pub driver_id: String,
    #[serde(default, deserialize_with = "null_marker")]
    pub fastest_lap_time: Option<String>,
    #[serde(default, deserialize_with = "null_marker")]
    pub position: Option<String>,
}

/// `drivers.csv`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub driver_id: String,
    pub forename: String,
    pub surname: String,
}

impl Driver {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.forename, self.surname)
    }
}

/// Treat both an empty field and `\N` as absent
fn null_marker<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty() && s != NULL_MARKER))
}
