mod cache;
mod client;
mod tables;
mod types;

pub use cache::{default_cache_dir, DownloadCache};
pub use client::{DataClient, Location};
pub use tables::{parse_country_names, parse_table, CountryNameIndex, Tables};
pub use types::{Circuit, Driver, Race, RaceResult};

use std::time::Duration;

use tracing::{info, instrument};

use crate::error::LoadError;

/// Default source of region names (world-atlas, keyed by ISO numeric code)
pub const DEFAULT_COUNTRY_NAMES: &str = "https://unpkg.com/world-atlas@1.1.4/world/50m.tsv";

/// Locations of the five datasets
#[derive(Debug, Clone, PartialEq)]
pub struct DataSources {
    pub circuits: Location,
    pub races: Location,
    pub results: Location,
    pub drivers: Location,
    pub country_names: Location,
}

impl DataSources {
    /// `data` is a directory (or base URL) holding the Ergast CSV files
    pub fn new(data: &str, country_names: &str) -> Result<Self, LoadError> {
        let base = Location::parse(data)?;
        Ok(Self {
            circuits: base.join("circuits.csv")?,
            races: base.join("races.csv")?,
            results: base.join("results.csv")?,
            drivers: base.join("drivers.csv")?,
            country_names: Location::parse(country_names)?,
        })
    }
}

/// Loads every table in one batch
pub struct DataService {
    client: DataClient,
    sources: DataSources,
}

impl DataService {
    pub fn new(
        sources: DataSources,
        timeout: Duration,
        cache: Option<DownloadCache>,
    ) -> Result<Self, LoadError> {
        Ok(Self {
            client: DataClient::new(timeout, cache)?,
            sources,
        })
    }

    /// Fetch all sources concurrently; any failure fails the whole load
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Tables, LoadError> {
        let (circuits, races, results, drivers, names) = futures::try_join!(
            self.client.fetch(&self.sources.circuits),
            self.client.fetch(&self.sources.races),
            self.client.fetch(&self.sources.results),
            self.client.fetch(&self.sources.drivers),
            self.client.fetch(&self.sources.country_names),
        )?;

        let tables = Tables {
            countries: parse_country_names(&names)?,
            circuits: parse_table(&circuits)?,
            races: parse_table(&races)?,
            results: parse_table(&results)?,
            drivers: parse_table(&drivers)?,
        };

        info!(
            countries = tables.countries.len(),
            circuits = tables.circuits.len(),
            races = tables.races.len(),
            results = tables.results.len(),
            drivers = tables.drivers.len(),
            "Datasets loaded"
        );

        Ok(tables)
    }
}
