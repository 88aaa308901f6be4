use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LoadError;

use super::types::{Circuit, Driver, Race, RaceResult};

/// A CSV table with a known set of required columns
pub trait Row: DeserializeOwned {
    const TABLE: &'static str;
    const REQUIRED: &'static [&'static str];
}

impl Row for Circuit {
    const TABLE: &'static str = "circuits";
    const REQUIRED: &'static [&'static str] = &["circuitId", "name", "country"];
}

impl Row for Race {
    const TABLE: &'static str = "races";
    const REQUIRED: &'static [&'static str] = &["raceId", "circuitId", "year"];
}

impl Row for RaceResult {
    const TABLE: &'static str = "results";
    const REQUIRED: &'static [&'static str] = &["raceId", "driverId"];
}

impl Row for Driver {
    const TABLE: &'static str = "drivers";
    const REQUIRED: &'static [&'static str] = &["driverId", "forename", "surname"];
}

/// Region id (ISO 3166 numeric) to country display name
#[derive(Debug, Clone, Default)]
pub struct CountryNameIndex {
    names: HashMap<String, String>,
    ids: HashMap<String, String>,
}

impl CountryNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later rows for the same id replace earlier ones, and the replaced name
    /// no longer maps back to that id. The reverse lookup keeps the first id
    /// seen for a name.
    pub fn insert(&mut self, region_id: impl Into<String>, name: impl Into<String>) {
        let region_id = region_id.into();
        let name = name.into();

        if let Some(old) = self.names.insert(region_id.clone(), name.clone()) {
            if old != name && self.ids.get(&old) == Some(&region_id) {
                self.ids.remove(&old);
            }
        }
        self.ids.entry(name).or_insert(region_id);
    }

    pub fn name(&self, region_id: &str) -> Option<&str> {
        self.names.get(region_id).map(String::as_str)
    }

    /// Reverse lookup used when a circuit marker is clicked
    pub fn region_for(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CountryNameIndex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (id, name) in iter {
            index.insert(id, name);
        }
        index
    }
}

/// The four F1 tables plus the country-name index, as loaded
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub countries: CountryNameIndex,
    pub circuits: Vec<Circuit>,
    pub races: Vec<Race>,
    pub results: Vec<RaceResult>,
    pub drivers: Vec<Driver>,
}

/// Parse a comma-separated table, checking its header first
pub fn parse_table<T: Row>(bytes: &[u8]) -> Result<Vec<T>, LoadError> {
    let csv_error = |source| LoadError::Csv {
        table: T::TABLE,
        source,
    };

    let mut rdr = ReaderBuilder::new().from_reader(bytes);
    let headers = rdr.headers().map_err(csv_error)?.clone();
    require_columns(T::TABLE, &headers, T::REQUIRED)?;

    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_error)?;

    debug!(table = T::TABLE, count = rows.len(), "Parsed table");
    Ok(rows)
}

/// Parse the world-atlas country TSV (`iso_n3` and `name` columns)
pub fn parse_country_names(bytes: &[u8]) -> Result<CountryNameIndex, LoadError> {
    const TABLE: &str = "country names";

    let csv_error = |source| LoadError::Csv {
        table: TABLE,
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(bytes);
    let headers = rdr.headers().map_err(csv_error)?.clone();
    let id_col = column_position(TABLE, &headers, "iso_n3")?;
    let name_col = column_position(TABLE, &headers, "name")?;

    let mut index = CountryNameIndex::new();
    for record in rdr.records() {
        let record = record.map_err(csv_error)?;
        if let (Some(id), Some(name)) = (record.get(id_col), record.get(name_col)) {
            index.insert(id, name);
        }
    }

    if index.is_empty() {
        return Err(LoadError::EmptyTable { table: TABLE });
    }

    debug!(count = index.len(), "Parsed country names");
    Ok(index)
}

fn require_columns(
    table: &'static str,
    headers: &StringRecord,
    required: &[&'static str],
) -> Result<(), LoadError> {
    for column in required {
        column_position(table, headers, column)?;
    }
    Ok(())
}

fn column_position(
    table: &'static str,
    headers: &StringRecord,
    column: &'static str,
) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or(LoadError::MissingColumn { table, column })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CIRCUITS: &str = "\
circuitId,circuitRef,name,location,country,lat,lng,alt,url
1,albert_park,\"Albert Park Grand Prix Circuit\",Melbourne,Australia,-37.8497,144.968,10,x
14,monza,\"Autodromo Nazionale di Monza\",Monza,Italy,45.6156,9.28111,162,x
";

    #[test]
    fn test_parse_ergast_circuits() {
        let circuits: Vec<Circuit> = parse_table(CIRCUITS.as_bytes()).unwrap();

        assert_eq!(circuits.len(), 2);
        assert_eq!(circuits[1].circuit_id, "14");
        assert_eq!(circuits[1].name, "Autodromo Nazionale di Monza");
        assert_eq!(circuits[1].country, "Italy");
        assert_eq!(circuits[1].location.as_deref(), Some("Monza"));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let data = "raceId,year\n10,2021\n";
        let err = parse_table::<Race>(data.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            LoadError::MissingColumn {
                table: "races",
                column: "circuitId"
            }
        ));
    }

    #[test]
    fn test_bad_year_is_a_csv_error() {
        let data = "raceId,circuitId,year\n10,1,soon\n";
        let err = parse_table::<Race>(data.as_bytes()).unwrap_err();

        assert!(matches!(err, LoadError::Csv { table: "races", .. }));
    }

    #[test]
    fn test_parse_country_names_tsv() {
        let data = "iso_a2\tiso_n3\tname\nIT\t380\tItaly\nAU\t036\tAustralia\n";
        let index = parse_country_names(data.as_bytes()).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.name("380"), Some("Italy"));
        assert_eq!(index.name("036"), Some("Australia"));
        assert_eq!(index.region_for("Italy"), Some("380"));
        assert_eq!(index.name("999"), None);
    }

    #[test]
    fn test_country_names_later_rows_replace() {
        let index: CountryNameIndex = [("-99", "N. Cyprus"), ("-99", "Somaliland")]
            .into_iter()
            .collect();

        assert_eq!(index.name("-99"), Some("Somaliland"));
        assert_eq!(index.region_for("N. Cyprus"), None);
        assert_eq!(index.region_for("Somaliland"), Some("-99"));
    }

    #[test]
    fn test_replaced_name_keeps_other_owner() {
        let index: CountryNameIndex = [("001", "Atlantis"), ("002", "Atlantis"), ("002", "Lemuria")]
            .into_iter()
            .collect();

        assert_eq!(index.region_for("Atlantis"), Some("001"));
        assert_eq!(index.region_for("Lemuria"), Some("002"));
        assert_eq!(index.name("002"), Some("Lemuria"));
    }

    #[test]
    fn test_empty_country_names_are_rejected() {
        let err = parse_country_names(b"iso_n3\tname\n").unwrap_err();
        assert!(matches!(err, LoadError::EmptyTable { table: "country names" }));
    }

    #[test]
    fn test_results_without_lap_times() {
        let data = "resultId,raceId,driverId,position\n1,10,d1,1\n";
        let results: Vec<RaceResult> = parse_table(data.as_bytes()).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fastest_lap_time, None);
        assert_eq!(results[0].position.as_deref(), Some("1"));
    }
}
