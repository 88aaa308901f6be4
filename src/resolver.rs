//! Region → circuits → most recent race → winner and fastest lap.
//!
//! `Dataset` indexes the loaded tables once; every click is then a handful of
//! hash lookups over immutable data.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::data::{Circuit, Race, RaceResult, Tables};
use crate::error::ResolveIssue;
use crate::viewport::Bounds;

/// Which result row of a race counts as the winner's
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum WinnerRule {
    /// First result row for the race, in table order
    #[default]
    FirstRow,
    /// First result row classified in position 1
    Position,
}

impl WinnerRule {
    pub fn toggle(self) -> Self {
        match self {
            WinnerRule::FirstRow => WinnerRule::Position,
            WinnerRule::Position => WinnerRule::FirstRow,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WinnerRule::FirstRow => "first row",
            WinnerRule::Position => "P1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub display_name: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastestLap {
    /// Lap time as recorded, empty when the row has none
    pub time: String,
}

/// The most recent past race at a circuit and its headline result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRace {
    pub race_id: String,
    pub race_name: Option<String>,
    pub winner: Winner,
    pub fastest_lap: FastestLap,
}

/// One matching circuit; `latest` is `None` when no race qualified or its
/// result could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitReport {
    pub circuit_id: String,
    pub name: String,
    pub location: Option<String>,
    pub coords: Option<(f64, f64)>,
    pub latest: Option<LatestRace>,
}

/// Everything shown for a clicked region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionInfo {
    pub region_id: String,
    /// Empty when the region id is not in the country index
    pub country_name: String,
    /// Matching circuits in table order
    pub circuits: Vec<CircuitReport>,
    pub issues: Vec<ResolveIssue>,
}

impl RegionInfo {
    /// One entry per circuit whose latest race resolved, in circuit order
    pub fn winners(&self) -> Vec<Winner> {
        self.circuits
            .iter()
            .filter_map(|c| c.latest.as_ref())
            .map(|l| l.winner.clone())
            .collect()
    }

    /// Same cardinality and order as [`RegionInfo::winners`]
    pub fn fastest_laps(&self) -> Vec<FastestLap> {
        self.circuits
            .iter()
            .filter_map(|c| c.latest.as_ref())
            .map(|l| l.fastest_lap.clone())
            .collect()
    }

    pub fn circuit_names(&self) -> Vec<&str> {
        self.circuits.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_resolved(&self) -> bool {
        !self.country_name.is_empty()
    }

    /// Bounding box of the region's circuit coordinates
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.circuits.iter().filter_map(|c| c.coords))
    }
}

/// Loaded tables plus the lookup indices built from them
pub struct Dataset {
    tables: Tables,
    circuits_by_country: HashMap<String, Vec<usize>>,
    races_by_circuit: HashMap<String, Vec<usize>>,
    results_by_race: HashMap<String, Vec<usize>>,
    drivers_by_id: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(tables: Tables) -> Self {
        let mut circuits_by_country: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, circuit) in tables.circuits.iter().enumerate() {
            circuits_by_country
                .entry(circuit.country.clone())
                .or_default()
                .push(i);
        }

        let mut races_by_circuit: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, race) in tables.races.iter().enumerate() {
            races_by_circuit
                .entry(race.circuit_id.clone())
                .or_default()
                .push(i);
        }

        let mut results_by_race: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, result) in tables.results.iter().enumerate() {
            results_by_race
                .entry(result.race_id.clone())
                .or_default()
                .push(i);
        }

        // Duplicate driver ids resolve to the first row
        let mut drivers_by_id = HashMap::new();
        for (i, driver) in tables.drivers.iter().enumerate() {
            drivers_by_id.entry(driver.driver_id.clone()).or_insert(i);
        }

        debug!(
            countries = circuits_by_country.len(),
            circuits = races_by_circuit.len(),
            races = results_by_race.len(),
            "Built lookup indices"
        );

        Self {
            tables,
            circuits_by_country,
            races_by_circuit,
            results_by_race,
            drivers_by_id,
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn country_name(&self, region_id: &str) -> Option<&str> {
        self.tables.countries.name(region_id)
    }

    /// Region id for a circuit's country, if the index knows that name
    pub fn region_for_country(&self, country: &str) -> Option<&str> {
        self.tables.countries.region_for(country)
    }

    /// Circuits whose country equals the region's name, in table order
    pub fn circuits_in(&self, region_id: &str) -> Vec<&Circuit> {
        self.country_name(region_id)
            .and_then(|name| self.circuits_by_country.get(name))
            .map(|indices| indices.iter().map(|&i| &self.tables.circuits[i]).collect())
            .unwrap_or_default()
    }

    /// True when at least one circuit lies in the region
    pub fn hosts_circuits(&self, region_id: &str) -> bool {
        self.country_name(region_id)
            .is_some_and(|name| self.circuits_by_country.contains_key(name))
    }

    /// Resolve a clicked region. Per-circuit problems are collected in
    /// `issues` and never abort the resolution.
    #[instrument(skip(self))]
    pub fn resolve_region(
        &self,
        region_id: &str,
        current_year: i32,
        rule: WinnerRule,
    ) -> RegionInfo {
        let Some(country_name) = self.country_name(region_id) else {
            debug!("Region not in country index");
            return RegionInfo {
                region_id: region_id.to_string(),
                ..RegionInfo::default()
            };
        };

        let mut info = RegionInfo {
            region_id: region_id.to_string(),
            country_name: country_name.to_string(),
            ..RegionInfo::default()
        };

        for circuit in self.circuits_in(region_id) {
            let latest = match self.most_recent_race(&circuit.circuit_id, current_year) {
                Some(race) => match self.race_report(circuit, race, rule) {
                    Ok(latest) => Some(latest),
                    Err(issue) => {
                        warn!(%issue, "Skipping circuit result");
                        info.issues.push(issue);
                        None
                    }
                },
                None => {
                    debug!(circuit = %circuit.name, "No race before {}", current_year);
                    None
                }
            };

            info.circuits.push(CircuitReport {
                circuit_id: circuit.circuit_id.clone(),
                name: circuit.name.clone(),
                location: circuit.location.clone(),
                coords: circuit.coords(),
                latest,
            });
        }

        debug!(
            country = %info.country_name,
            circuits = info.circuits.len(),
            issues = info.issues.len(),
            "Resolved region"
        );
        info
    }

    /// Greatest year strictly below `current_year`; equal years keep the
    /// earlier row.
    pub fn most_recent_race(&self, circuit_id: &str, current_year: i32) -> Option<&Race> {
        let indices = self.races_by_circuit.get(circuit_id)?;
        let mut best: Option<&Race> = None;

        for race in indices.iter().map(|&i| &self.tables.races[i]) {
            if race.year >= current_year {
                continue;
            }
            match best {
                Some(current) if race.year <= current.year => {}
                _ => best = Some(race),
            }
        }

        best
    }

    fn winning_result(&self, race_id: &str, rule: WinnerRule) -> Option<&RaceResult> {
        let mut rows = self
            .results_by_race
            .get(race_id)?
            .iter()
            .map(|&i| &self.tables.results[i]);

        match rule {
            WinnerRule::FirstRow => rows.next(),
            WinnerRule::Position => rows.find(|r| r.position.as_deref() == Some("1")),
        }
    }

    fn race_report(
        &self,
        circuit: &Circuit,
        race: &Race,
        rule: WinnerRule,
    ) -> Result<LatestRace, ResolveIssue> {
        let result = self
            .winning_result(&race.race_id, rule)
            .ok_or_else(|| ResolveIssue::MissingResult {
                circuit: circuit.name.clone(),
                race_id: race.race_id.clone(),
            })?;

        let driver = self
            .drivers_by_id
            .get(&result.driver_id)
            .map(|&i| &self.tables.drivers[i])
            .ok_or_else(|| ResolveIssue::MissingDriver {
                circuit: circuit.name.clone(),
                race_id: race.race_id.clone(),
                driver_id: result.driver_id.clone(),
            })?;

        Ok(LatestRace {
            race_id: race.race_id.clone(),
            race_name: race.name.clone(),
            winner: Winner {
                display_name: driver.display_name(),
                year: race.year,
            },
            fastest_lap: FastestLap {
                time: result.fastest_lap_time.clone().unwrap_or_default(),
            },
        })
    }

    /// Every circuit with coordinates, for map markers
    pub fn circuit_markers(&self) -> impl Iterator<Item = &Circuit> {
        self.tables.circuits.iter().filter(|c| c.coords().is_some())
    }

    /// Closest circuit to (lon, lat) within `max_distance` degrees
    pub fn nearest_circuit(&self, lon: f64, lat: f64, max_distance: f64) -> Option<&Circuit> {
        self.circuit_markers()
            .filter_map(|c| {
                let (x, y) = c.coords()?;
                let distance = ((x - lon).powi(2) + (y - lat).powi(2)).sqrt();
                (distance <= max_distance).then_some((c, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }
}
