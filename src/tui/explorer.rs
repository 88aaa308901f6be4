use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::resolver::{Dataset, RegionInfo, WinnerRule};
use crate::viewport::Viewport;

/// A row in the country list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    pub region_id: String,
    pub name: String,
    /// At least one circuit lies in this country
    pub hosts: bool,
}

/// Terminal-independent explorer state: which countries are listed, which
/// one is selected, and where the map is looking.
#[derive(Default)]
pub struct Explorer {
    dataset: Option<Arc<Dataset>>,
    regions: Vec<RegionEntry>,
    cursor: usize,
    selected: Option<RegionInfo>,
    viewport: Viewport,
}

impl Explorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly loaded dataset; any previous selection is dropped
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>, hosts_only: bool) {
        self.dataset = Some(dataset);
        self.selected = None;
        self.viewport = Viewport::world();
        self.cursor = 0;
        self.rebuild_regions(hosts_only);
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.dataset.as_ref()
    }

    pub fn regions(&self) -> &[RegionEntry] {
        &self.regions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&RegionInfo> {
        self.selected.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Re-list countries sorted by name, keeping the cursor on the same
    /// country when it is still listed
    pub fn rebuild_regions(&mut self, hosts_only: bool) {
        let Some(dataset) = &self.dataset else {
            return;
        };

        let current = self.regions.get(self.cursor).map(|r| r.region_id.clone());

        let mut regions: Vec<RegionEntry> = dataset
            .tables()
            .countries
            .iter()
            .map(|(id, name)| RegionEntry {
                region_id: id.to_string(),
                name: name.to_string(),
                hosts: dataset.hosts_circuits(id),
            })
            .filter(|r| r.hosts || !hosts_only)
            .collect();
        regions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.region_id.cmp(&b.region_id)));

        self.cursor = current
            .and_then(|id| regions.iter().position(|r| r.region_id == id))
            .unwrap_or(0);
        self.regions = regions;

        debug!(count = self.regions.len(), hosts_only, "Rebuilt region list");
    }

    /// Move the list cursor, clamped to the list
    pub fn move_cursor(&mut self, delta: isize) {
        if self.regions.is_empty() {
            return;
        }
        let last = self.regions.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    /// Select the country under the list cursor
    pub fn select_cursor(&mut self, current_year: i32, rule: WinnerRule) -> Option<&RegionInfo> {
        let region_id = self.regions.get(self.cursor)?.region_id.clone();
        self.select(&region_id, current_year, rule)
    }

    /// Resolve a region and zoom the map to its circuits
    pub fn select(
        &mut self,
        region_id: &str,
        current_year: i32,
        rule: WinnerRule,
    ) -> Option<&RegionInfo> {
        let dataset = self.dataset.as_ref()?;
        let info = dataset.resolve_region(region_id, current_year, rule);

        self.viewport = info.bounds().map(Viewport::fit).unwrap_or_default();
        if let Some(pos) = self.regions.iter().position(|r| r.region_id == region_id) {
            self.cursor = pos;
        }

        info!(
            region = region_id,
            country = %info.country_name,
            circuits = info.circuits.len(),
            "Region selected"
        );

        self.selected = Some(info);
        self.selected.as_ref()
    }

    /// Resolve the selection again, e.g. after the winner rule changed
    pub fn refresh(&mut self, current_year: i32, rule: WinnerRule) {
        let (Some(dataset), Some(selected)) = (&self.dataset, &self.selected) else {
            return;
        };
        self.selected = Some(dataset.resolve_region(&selected.region_id, current_year, rule));
    }

    /// A map click at (lon, lat): select the country of the nearest circuit
    pub fn click(
        &mut self,
        lon: f64,
        lat: f64,
        current_year: i32,
        rule: WinnerRule,
    ) -> Option<&RegionInfo> {
        let dataset = Arc::clone(self.dataset.as_ref()?);
        let circuit = dataset.nearest_circuit(lon, lat, self.viewport.hit_radius())?;

        match dataset.region_for_country(&circuit.country) {
            Some(region_id) => self.select(region_id, current_year, rule),
            None => {
                warn!(
                    circuit = %circuit.name,
                    country = %circuit.country,
                    "Country not in region index"
                );
                None
            }
        }
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Circuit, CountryNameIndex, Driver, Race, RaceResult, Tables};

    fn circuit(id: &str, name: &str, country: &str, lng: f64, lat: f64) -> Circuit {
        Circuit {
            circuit_id: id.into(),
            name: name.into(),
            country: country.into(),
            location: None,
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    fn dataset() -> Arc<Dataset> {
        let countries: CountryNameIndex =
            [("380", "Italy"), ("036", "Australia"), ("250", "France")]
                .into_iter()
                .collect();

        Arc::new(Dataset::new(Tables {
            countries,
            circuits: vec![
                circuit("14", "Monza", "Italy", 9.28, 45.62),
                circuit("1", "Albert Park", "Australia", 144.97, -37.85),
                circuit("99", "Sakhir", "Bahrain", 50.51, 26.03),
            ],
            races: vec![Race {
                race_id: "10".into(),
                circuit_id: "14".into(),
                year: 2021,
                name: Some("Italian Grand Prix".into()),
            }],
            results: vec![RaceResult {
                race_id: "10".into(),
                driver_id: "d1".into(),
                fastest_lap_time: Some("1:24.812".into()),
                position: Some("1".into()),
            }],
            drivers: vec![Driver {
                driver_id: "d1".into(),
                forename: "Daniel".into(),
                surname: "Ricciardo".into(),
            }],
        }))
    }

    #[test]
    fn test_hosts_only_listing() {
        let mut explorer = Explorer::new();
        explorer.set_dataset(dataset(), true);

        let names: Vec<&str> = explorer.regions().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Australia", "Italy"]);

        explorer.rebuild_regions(false);
        let names: Vec<&str> = explorer.regions().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Australia", "France", "Italy"]);
        assert!(!explorer.regions()[1].hosts);
    }

    #[test]
    fn test_cursor_survives_rebuild() {
        let mut explorer = Explorer::new();
        explorer.set_dataset(dataset(), true);
        explorer.move_cursor(1);
        assert_eq!(explorer.regions()[explorer.cursor()].name, "Italy");

        explorer.rebuild_regions(false);
        assert_eq!(explorer.regions()[explorer.cursor()].name, "Italy");
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut explorer = Explorer::new();
        explorer.move_cursor(1);
        assert_eq!(explorer.cursor(), 0);

        explorer.set_dataset(dataset(), true);
        explorer.move_cursor(-3);
        assert_eq!(explorer.cursor(), 0);
        explorer.move_cursor(10);
        assert_eq!(explorer.cursor(), 1);
    }

    #[test]
    fn test_select_zooms_to_region() {
        let mut explorer = Explorer::new();
        explorer.set_dataset(dataset(), true);

        let info = explorer.select("380", 2022, WinnerRule::FirstRow).unwrap();
        assert_eq!(info.country_name, "Italy");
        assert_eq!(info.winners()[0].display_name, "Daniel Ricciardo");

        let view = explorer.viewport();
        assert!(view.scale > 1.0);
        assert!((view.center.0 - 9.28).abs() < 1e-9);
        assert_eq!(explorer.regions()[explorer.cursor()].region_id, "380");

        explorer.reset_view();
        assert_eq!(explorer.viewport(), Viewport::world());
    }

    #[test]
    fn test_select_without_circuits_shows_world() {
        let mut explorer = Explorer::new();
        explorer.set_dataset(dataset(), false);

        let info = explorer.select("250", 2022, WinnerRule::FirstRow).unwrap();
        assert!(info.circuits.is_empty());
        assert_eq!(explorer.viewport(), Viewport::world());
    }

    #[test]
    fn test_select_before_load_is_ignored() {
        let mut explorer = Explorer::new();
        assert!(explorer.select("380", 2022, WinnerRule::FirstRow).is_none());
        assert!(explorer.select_cursor(2022, WinnerRule::FirstRow).is_none());
    }

    #[test]
    fn test_click_near_marker_selects_country() {
        let mut explorer = Explorer::new();
        explorer.set_dataset(dataset(), true);

        let info = explorer.click(145.5, -37.0, 2022, WinnerRule::FirstRow).unwrap();
        assert_eq!(info.country_name, "Australia");
        assert!(info.winners().is_empty());
        assert_eq!(explorer.regions()[explorer.cursor()].name, "Australia");
    }

    #[test]
    fn test_click_far_from_markers_or_unindexed_country() {
        let mut explorer = Explorer::new();
        explorer.set_dataset(dataset(), true);

        assert!(explorer.click(-100.0, 40.0, 2022, WinnerRule::FirstRow).is_none());
        // Bahrain has a circuit but no region id
        assert!(explorer.click(50.5, 26.0, 2022, WinnerRule::FirstRow).is_none());
        assert!(explorer.selected().is_none());
    }

    #[test]
    fn test_refresh_applies_new_rule() {
        let mut explorer = Explorer::new();
        explorer.set_dataset(dataset(), true);
        explorer.select("380", 2022, WinnerRule::FirstRow);

        explorer.refresh(2021, WinnerRule::Position);
        assert!(explorer.selected().unwrap().winners().is_empty());
    }
}
