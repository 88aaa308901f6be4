use clap::Parser;

use crate::data::DEFAULT_COUNTRY_NAMES;
use crate::resolver::WinnerRule;

#[derive(Parser, Debug, Clone)]
#[command(name = "circuitmap")]
#[command(about = "Explore Formula 1 circuits, winners and fastest laps on a world map")]
#[command(version)]
pub struct Args {
    // Data
    /// Directory or base URL holding circuits.csv, races.csv, results.csv and drivers.csv
    #[arg(long, default_value = "f1db_csv")]
    pub data: String,

    /// Path or URL of the region id -> country name TSV (iso_n3, name)
    #[arg(long, default_value = DEFAULT_COUNTRY_NAMES)]
    pub country_names: String,

    // Lookup
    /// Races from this year on are ignored (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Which result row names the winner
    #[arg(long, value_enum, default_value_t = WinnerRule::FirstRow)]
    pub winner_rule: WinnerRule,

    /// Resolve one region id (ISO numeric, e.g. 380) and print it instead of starting the map
    #[arg(long)]
    pub region: Option<String>,

    /// Print the region as JSON (with --region)
    #[arg(long, requires = "region")]
    pub json: bool,

    // Display
    /// List every country, not only those hosting a circuit
    #[arg(long)]
    pub all_countries: bool,

    // Network
    /// HTTP timeout for remote datasets (seconds)
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Custom cache directory
    #[arg(long)]
    pub cache_dir: Option<std::path::PathBuf>,

    /// Always download remote datasets
    #[arg(long)]
    pub no_cache: bool,

    // Debug
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Check if running the one-shot lookup instead of the TUI
    pub fn is_one_shot(&self) -> bool {
        self.region.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["circuitmap"]);

        assert_eq!(args.data, "f1db_csv");
        assert_eq!(args.country_names, DEFAULT_COUNTRY_NAMES);
        assert_eq!(args.winner_rule, WinnerRule::FirstRow);
        assert_eq!(args.year, None);
        assert!(!args.is_one_shot());
    }

    #[test]
    fn test_one_shot_flags() {
        let args = Args::parse_from([
            "circuitmap",
            "--region",
            "380",
            "--json",
            "--year",
            "2022",
            "--winner-rule",
            "position",
        ]);

        assert!(args.is_one_shot());
        assert!(args.json);
        assert_eq!(args.year, Some(2022));
        assert_eq!(args.winner_rule, WinnerRule::Position);
    }

    #[test]
    fn test_json_requires_region() {
        assert!(Args::try_parse_from(["circuitmap", "--json"]).is_err());
    }
}
