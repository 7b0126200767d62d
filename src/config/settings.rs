//! Simulation settings loaded from a TOML control file
//!
//! The control file is one `name = value` line per parameter with `#`
//! comments. Parameter names are matched exactly; unknown or duplicate
//! names are fatal, as is omitting a required parameter. Command-line
//! `--set name=value` overrides are applied on top of the file before
//! typing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::core::error::{Result, SimError};

/// Complete parameter set for a simulation run.
///
/// Rate parameters use non-positive values as "draw at the root" sentinels,
/// mirroring the control-file conventions: `lambdaInit0 = -1` means the root
/// speciation rate is drawn from the `rmin`/`rmax`/`epsmin`/`epsmax` ranges
/// rather than fixed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Poisson rate of regime-shift events along a growing lineage.
    #[serde(rename = "eventRate")]
    pub event_rate: f64,

    /// Root speciation rate; non-positive means "draw at the root".
    #[serde(rename = "lambdaInit0", default = "minus_one")]
    pub lambda_init0: f64,

    /// Exponential time-decay coefficient of the speciation rate.
    /// Negative values are clamped to zero at tree construction.
    #[serde(rename = "lambdaShift0", default = "minus_one")]
    pub lambda_shift0: f64,

    /// Root extinction rate; non-positive means "draw at the root".
    #[serde(rename = "muInit0", default = "minus_one")]
    pub mu_init0: f64,

    /// Global simulation horizon: surviving lineages stop at this age.
    #[serde(rename = "maxTime")]
    pub max_time: f64,

    /// Node-count cap; a tree exceeding it is discarded and resimulated.
    #[serde(rename = "maxNumberOfNodes", default = "default_node_cap")]
    pub max_number_of_nodes: usize,

    /// Age after which regime shifts can no longer fire. The default of -1
    /// disables shifts outright, since every clock time is past it.
    #[serde(rename = "maxTimeForEvent", default = "minus_one")]
    pub max_time_for_event: f64,

    /// Clock increment bounding each waiting-time draw; the rate functions
    /// are treated as constant within one increment.
    #[serde(default = "default_inc")]
    pub inc: f64,

    /// Lower bound of the net-diversification draw (root and shift regimes).
    #[serde(default = "minus_one")]
    pub rmin: f64,

    /// Upper bound of the net-diversification draw.
    #[serde(default = "minus_one")]
    pub rmax: f64,

    /// Draw the root net diversification log-uniformly over [rmin, rmax]
    /// instead of uniformly. Shift-time draws are always uniform.
    #[serde(rename = "rInitLogscale", default, deserialize_with = "bool_or_int")]
    pub r_init_logscale: bool,

    /// Lower bound of the extinction-fraction draw.
    #[serde(default)]
    pub epsmin: f64,

    /// Upper bound of the extinction-fraction draw.
    #[serde(default = "default_epsmax")]
    pub epsmax: f64,

    /// Number of accepted tree replicates to produce.
    #[serde(rename = "numberOfSims")]
    pub number_of_sims: usize,

    /// Acceptance window on tip count, inclusive.
    pub mintaxa: usize,
    pub maxtaxa: usize,

    /// Acceptance window on regime-shift count, inclusive.
    #[serde(rename = "minNumberOfShifts")]
    pub min_number_of_shifts: usize,
    #[serde(rename = "maxNumberOfShifts")]
    pub max_number_of_shifts: usize,

    /// Output path for the Newick tree lines.
    pub treefile: PathBuf,

    /// Output path for the regime-event table.
    pub eventfile: PathBuf,

    /// Random seed; negative means "seed from entropy".
    #[serde(default = "default_seed")]
    pub seed: i64,

    /// Whether existing output files may be replaced.
    #[serde(default = "default_true", deserialize_with = "bool_or_int")]
    pub overwrite: bool,
}

fn minus_one() -> f64 {
    -1.0
}

fn default_node_cap() -> usize {
    2000
}

fn default_inc() -> f64 {
    0.1
}

fn default_epsmax() -> f64 {
    1.0
}

fn default_seed() -> i64 {
    -1
}

fn default_true() -> bool {
    true
}

/// Accepts TOML `true`/`false` as well as the `0`/`1` integers used by the
/// legacy control-file format.
fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Int(i) => i != 0,
    })
}

impl Settings {
    /// Parses settings from control-file text without validating them.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads the control file, applies `name=value` overrides, and
    /// validates the result.
    pub fn load(path: &Path, overrides: &[String]) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut table: toml::Table = toml::from_str(&text)?;
        for entry in overrides {
            let (name, value) = parse_override(entry)?;
            table.insert(name, value);
        }
        let settings: Settings = toml::Value::Table(table).try_into()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks internal consistency; every violation is fatal.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_time > 0.0) {
            return Err(SimError::InvalidSetting(format!(
                "maxTime must be positive, got {}",
                self.max_time
            )));
        }
        if !(self.inc > 0.0) {
            return Err(SimError::InvalidSetting(format!(
                "inc must be positive, got {}",
                self.inc
            )));
        }
        if self.number_of_sims < 1 {
            return Err(SimError::InvalidSetting(
                "numberOfSims must be at least 1".into(),
            ));
        }
        if self.max_number_of_nodes < 1 {
            return Err(SimError::InvalidSetting(
                "maxNumberOfNodes must be at least 1".into(),
            ));
        }
        if self.mintaxa > self.maxtaxa {
            return Err(SimError::InvalidSetting(format!(
                "mintaxa ({}) exceeds maxtaxa ({})",
                self.mintaxa, self.maxtaxa
            )));
        }
        if self.min_number_of_shifts > self.max_number_of_shifts {
            return Err(SimError::InvalidSetting(format!(
                "minNumberOfShifts ({}) exceeds maxNumberOfShifts ({})",
                self.min_number_of_shifts, self.max_number_of_shifts
            )));
        }
        if !(0.0 <= self.epsmin && self.epsmin <= self.epsmax && self.epsmax <= 1.0) {
            return Err(SimError::InvalidSetting(format!(
                "epsmin/epsmax must satisfy 0 <= epsmin <= epsmax <= 1, got {} and {}",
                self.epsmin, self.epsmax
            )));
        }
        // The r ranges are consulted whenever a regime can be drawn: at the
        // root when lambdaInit0 is a sentinel, and at shift times whenever
        // shifts can fire at all.
        let draws_regimes = self.lambda_init0 <= 0.0
            || (self.event_rate > 0.0 && self.max_time_for_event > 0.0);
        if draws_regimes && !(self.rmin > 0.0 && self.rmin <= self.rmax) {
            return Err(SimError::InvalidSetting(format!(
                "rmin/rmax must satisfy 0 < rmin <= rmax when regimes are drawn, got {} and {}",
                self.rmin, self.rmax
            )));
        }
        Ok(())
    }
}

fn parse_override(entry: &str) -> Result<(String, toml::Value)> {
    let Some((name, raw)) = entry.split_once('=') else {
        return Err(SimError::InvalidSetting(format!(
            "override `{}` is not of the form name=value",
            entry
        )));
    };
    let name = name.trim().to_string();
    let raw = raw.trim();
    // Parse the value as a TOML fragment; anything that does not parse
    // (a bare file name, say) is taken as a string.
    let value = match format!("v = {}", raw).parse::<toml::Table>() {
        Ok(mut table) => match table.remove("v") {
            Some(value) => value,
            None => toml::Value::String(raw.to_string()),
        },
        Err(_) => toml::Value::String(raw.to_string()),
    };
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONTROL: &str = r#"
# birth-death run with shifts enabled
eventRate = 0.5
lambdaInit0 = 1.0
lambdaShift0 = 0.0
muInit0 = 0.25
maxTime = 10.0
maxTimeForEvent = 10.0
rmin = 0.2
rmax = 1.0
numberOfSims = 5
mintaxa = 2
maxtaxa = 500
minNumberOfShifts = 0
maxNumberOfShifts = 50
treefile = "trees.txt"
eventfile = "events.csv"
"#;

    #[test]
    fn test_full_control_file_parses() {
        let s = Settings::from_toml(FULL_CONTROL).unwrap();
        assert_eq!(s.event_rate, 0.5);
        assert_eq!(s.number_of_sims, 5);
        assert_eq!(s.treefile, PathBuf::from("trees.txt"));
        s.validate().unwrap();
    }

    #[test]
    fn test_defaults_applied_for_optional_parameters() {
        let s = Settings::from_toml(FULL_CONTROL).unwrap();
        assert_eq!(s.max_number_of_nodes, 2000);
        assert_eq!(s.inc, 0.1);
        assert_eq!(s.epsmin, 0.0);
        assert_eq!(s.epsmax, 1.0);
        assert_eq!(s.seed, -1);
        assert!(!s.r_init_logscale);
        assert!(s.overwrite);
    }

    #[test]
    fn test_missing_required_parameter_names_it() {
        let text = FULL_CONTROL.replace("maxTime = 10.0", "");
        let err = Settings::from_toml(&text).unwrap_err();
        assert!(err.to_string().contains("maxTime"), "got: {}", err);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let text = format!("{}\nnotAParameter = 3\n", FULL_CONTROL);
        let err = Settings::from_toml(&text).unwrap_err();
        assert!(err.to_string().contains("notAParameter"), "got: {}", err);
    }

    #[test]
    fn test_legacy_integer_booleans() {
        let text = format!("{}\nrInitLogscale = 1\noverwrite = 0\n", FULL_CONTROL);
        let s = Settings::from_toml(&text).unwrap();
        assert!(s.r_init_logscale);
        assert!(!s.overwrite);
    }

    #[test]
    fn test_override_parsing_types_values() {
        let (name, value) = parse_override("numberOfSims = 12").unwrap();
        assert_eq!(name, "numberOfSims");
        assert_eq!(value, toml::Value::Integer(12));

        let (_, value) = parse_override("inc=0.05").unwrap();
        assert_eq!(value, toml::Value::Float(0.05));

        let (_, value) = parse_override("treefile=out.tre").unwrap();
        assert_eq!(value, toml::Value::String("out.tre".into()));

        assert!(parse_override("no-equals-sign").is_err());
    }

    #[test]
    fn test_validate_rejects_inconsistent_windows() {
        let mut s = Settings::from_toml(FULL_CONTROL).unwrap();
        s.mintaxa = 10;
        s.maxtaxa = 2;
        assert!(s.validate().is_err());

        let mut s = Settings::from_toml(FULL_CONTROL).unwrap();
        s.min_number_of_shifts = 5;
        s.max_number_of_shifts = 1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_step_and_horizon() {
        let mut s = Settings::from_toml(FULL_CONTROL).unwrap();
        s.inc = 0.0;
        assert!(s.validate().is_err());

        let mut s = Settings::from_toml(FULL_CONTROL).unwrap();
        s.max_time = -2.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_requires_r_range_when_drawing_regimes() {
        // lambdaInit0 sentinel means the root regime is drawn, so the r
        // range must be usable.
        let text = FULL_CONTROL
            .replace("lambdaInit0 = 1.0", "lambdaInit0 = -1.0")
            .replace("rmin = 0.2", "rmin = -1.0")
            .replace("rmax = 1.0", "rmax = -1.0");
        let s = Settings::from_toml(&text).unwrap();
        assert!(s.validate().is_err());

        // With a fixed root regime and shifts disabled, the sentinel r
        // range is fine.
        let text = FULL_CONTROL
            .replace("eventRate = 0.5", "eventRate = 0.0")
            .replace("rmin = 0.2", "rmin = -1.0")
            .replace("rmax = 1.0", "rmax = -1.0");
        let s = Settings::from_toml(&text).unwrap();
        s.validate().unwrap();
    }
}
