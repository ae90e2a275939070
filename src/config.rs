use crate::error::AnalysisError;
use crate::estimator::{Relationship, Side, Threshold};
use crate::instrument::{Instrument, PerInstrument};
use crate::resample::GridConfig;

/// Top-level analysis configuration, usually read from a TOML file.
///
/// Every section falls back to the reference study's settings when omitted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub instruments: InstrumentsConfig,
    pub grid: GridConfig,
    pub windows: WindowsConfig,
    pub bootstrap: BootstrapConfig,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InstrumentsConfig {
    pub note: InstrumentConfig,
    pub ultra: InstrumentConfig,
    pub bond: InstrumentConfig,
}

/// Source file (relative to the input directory) and tick size of one contract.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub file: Option<std::path::PathBuf>,
    pub tick_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WindowsConfig {
    /// Clock hours splitting the session into before/after windows.
    pub hour_boundaries: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub iterations: usize,
    pub seed: u64,
    pub alpha: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            instruments: InstrumentsConfig::default(),
            grid: GridConfig::default(),
            windows: WindowsConfig::default(),
            bootstrap: BootstrapConfig::default(),
            relationships: default_relationships(),
        }
    }
}

impl Default for WindowsConfig {
    fn default() -> Self {
        WindowsConfig { hour_boundaries: vec![7, 8, 9, 10, 11] }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig { iterations: 10_000, seed: 42, alpha: 0.05 }
    }
}

/// Mean-reversion heuristics studied by default: a one-sigma excursion before the
/// hour followed by a return through the mean after it.
fn default_relationships() -> Vec<Relationship> {
    vec![
        Relationship {
            name: "revert-up".to_string(),
            given: Threshold { side: Side::Below, sigma: 1.0 },
            event: Threshold { side: Side::Above, sigma: 0.0 },
        },
        Relationship {
            name: "revert-down".to_string(),
            given: Threshold { side: Side::Above, sigma: 1.0 },
            event: Threshold { side: Side::Below, sigma: 0.0 },
        },
    ]
}

impl InstrumentsConfig {
    fn get(&self, instrument: Instrument) -> &InstrumentConfig {
        match instrument {
            Instrument::Note => &self.note,
            Instrument::Ultra => &self.ultra,
            Instrument::Bond => &self.bond,
        }
    }
}

impl AnalysisConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| {
            AnalysisError::SourceUnavailable { path: path.to_path_buf(), source }
        })?;
        let config: AnalysisConfig = toml::from_str(&raw)
            .map_err(|e| AnalysisError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn file_for(&self, instrument: Instrument) -> std::path::PathBuf {
        self.instruments
            .get(instrument)
            .file
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from(instrument.default_file()))
    }

    pub fn tick_size_for(&self, instrument: Instrument) -> f64 {
        self.instruments
            .get(instrument)
            .tick_size
            .unwrap_or_else(|| instrument.default_tick_size())
    }

    pub fn tick_sizes(&self) -> PerInstrument<f64> {
        PerInstrument::from_fn(|instrument| self.tick_size_for(instrument))
    }

    /// Checks the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for instrument in Instrument::ALL {
            let tick_size = self.tick_size_for(instrument);
            if !(tick_size > 0.0) || !tick_size.is_finite() {
                return Err(AnalysisError::InvalidTickSize { instrument, tick_size });
            }
        }

        let grid = &self.grid;
        if grid.step_secs == 0 {
            return Err(AnalysisError::InvalidConfig("grid.step_secs must be positive".into()));
        }
        if grid.start_secs >= grid.end_secs {
            return Err(AnalysisError::InvalidConfig(format!(
                "grid.start_secs ({}) must precede grid.end_secs ({})",
                grid.start_secs, grid.end_secs
            )));
        }
        if grid.end_secs > 24 * 3600 {
            return Err(AnalysisError::InvalidConfig("grid.end_secs is past midnight".into()));
        }

        let boundaries = &self.windows.hour_boundaries;
        if boundaries.is_empty() {
            return Err(AnalysisError::InvalidConfig("windows.hour_boundaries is empty".into()));
        }
        if boundaries.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AnalysisError::InvalidConfig(
                "windows.hour_boundaries must be strictly ascending".into(),
            ));
        }
        let effective_start = grid.effective_start();
        for &hour in boundaries {
            let secs = hour.checked_mul(3600);
            if secs.is_none_or(|secs| secs <= effective_start || secs > grid.end_secs) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "hour boundary {} lies outside the analysed grid",
                    hour
                )));
            }
        }

        let bootstrap = &self.bootstrap;
        if bootstrap.iterations == 0 {
            return Err(AnalysisError::InvalidConfig("bootstrap.iterations must be positive".into()));
        }
        if !(bootstrap.alpha > 0.0 && bootstrap.alpha < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "bootstrap.alpha must lie in (0, 1), got {}",
                bootstrap.alpha
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_size_for(Instrument::Bond), 312.5);
        assert_eq!(config.file_for(Instrument::Note), std::path::PathBuf::from("ZN.csv"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let raw = r#"
            [instruments.bond]
            tick_size = 1.0

            [bootstrap]
            seed = 7
        "#;
        let config: AnalysisConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.tick_size_for(Instrument::Bond), 1.0);
        assert_eq!(config.tick_size_for(Instrument::Note), 156.25);
        assert_eq!(config.bootstrap.seed, 7);
        assert_eq!(config.bootstrap.iterations, 10_000);
        assert_eq!(config.windows.hour_boundaries, vec![7, 8, 9, 10, 11]);
        assert_eq!(config.relationships.len(), 2);
    }

    #[test]
    fn test_relationships_from_toml() {
        let raw = r#"
            [[relationships]]
            name = "extend-down"
            given = { side = "below", sigma = 1.0 }
            event = { side = "below", sigma = 2.0 }
        "#;
        let config: AnalysisConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.relationships.len(), 1);
        assert_eq!(config.relationships[0].event.side, Side::Below);
        assert_eq!(config.relationships[0].event.sigma, 2.0);
    }

    #[test]
    fn test_rejects_non_positive_tick_size() {
        let mut config = AnalysisConfig::default();
        config.instruments.ultra.tick_size = Some(0.0);
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidTickSize { instrument: Instrument::Ultra, .. })
        ));
    }

    #[test]
    fn test_rejects_unordered_boundaries() {
        let mut config = AnalysisConfig::default();
        config.windows.hour_boundaries = vec![7, 9, 8];
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_boundary_before_cutoff() {
        let mut config = AnalysisConfig::default();
        config.windows.hour_boundaries = vec![6, 7];
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_boundary_past_midnight() {
        for raw in ["[windows]\nhour_boundaries = [7, 2000000]", "[windows]\nhour_boundaries = [7, 25]"] {
            let config: AnalysisConfig = toml::from_str(raw).unwrap();
            assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let mut config = AnalysisConfig::default();
        config.bootstrap.alpha = 1.0;
        assert!(config.validate().is_err());
    }
}
