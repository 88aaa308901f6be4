use std::fmt::Write;

use serde_json::{json, Value};

use crate::resolver::RegionInfo;

/// JSON shape for `--region --json`: the country label plus the three lists,
/// and the per-circuit records they are derived from
pub fn to_json(info: &RegionInfo) -> Value {
    json!({
        "regionId": info.region_id,
        "countryName": info.country_name,
        "circuits": info.circuits.iter().map(|c| json!({ "name": c.name })).collect::<Vec<_>>(),
        "winners": info.winners(),
        "fastestLaps": info.fastest_laps(),
        "details": info.circuits,
        "issues": info.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

/// Plain-text rendition of the region panel
pub fn to_text(info: &RegionInfo) -> String {
    let mut out = String::new();

    if info.is_resolved() {
        let _ = writeln!(out, "{} ({})", info.country_name, info.region_id);
    } else {
        let _ = writeln!(out, "Unknown region {}", info.region_id);
    }

    let _ = writeln!(out, "Circuits:");
    for circuit in &info.circuits {
        match &circuit.location {
            Some(location) => {
                let _ = writeln!(out, "  - {} ({})", circuit.name, location);
            }
            None => {
                let _ = writeln!(out, "  - {}", circuit.name);
            }
        }
    }

    let _ = writeln!(out, "Latest winners:");
    for winner in info.winners() {
        let _ = writeln!(out, "  - {} ({})", winner.display_name, winner.year);
    }

    let _ = writeln!(out, "Fastest laps:");
    for lap in info.fastest_laps() {
        let _ = writeln!(out, "  - {}", if lap.time.is_empty() { "-" } else { lap.time.as_str() });
    }

    if !info.issues.is_empty() {
        let _ = writeln!(out, "Issues:");
        for issue in &info.issues {
            let _ = writeln!(out, "  - {}", issue);
        }
    }

    out
}
