use std::path::Path;

use heatnet_core::SolveOptions;
use serde::Deserialize;

use crate::error::CliError;

/// Contents of the TOML config file, every section is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub solve: SolveOptions,
    pub output: OutputConfig,
    /// Worker threads for the parallel phases, rayon's default when unset
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Project the GeoJSON output to WGS84
    pub wgs84: bool,
    pub pretty: bool,
}

/// Command line values that take precedence over the file
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub candidates: Option<usize>,
    pub backbone: bool,
    pub wgs84: bool,
    pub pretty: bool,
    pub threads: Option<usize>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(text)?)
    }

    /// Flags can only switch features on, they never turn off what the
    /// file enabled
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(k) = overrides.candidates {
            self.solve.candidates_per_building = k;
        }
        self.solve.backbone |= overrides.backbone;
        self.output.wgs84 |= overrides.wgs84;
        self.output.pretty |= overrides.pretty;
        if overrides.threads.is_some() {
            self.threads = overrides.threads;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.solve.candidates_per_building, 3);
        assert!(!config.solve.backbone);
    }

    #[test]
    fn reads_all_sections() {
        let config = Config::from_toml(
            r#"
            threads = 4

            [solve]
            candidates_per_building = 5
            backbone = true

            [output]
            wgs84 = true
            "#,
        )
        .unwrap();
        assert_eq!(config.solve.candidates_per_building, 5);
        assert!(config.solve.backbone);
        assert!(config.output.wgs84);
        assert!(!config.output.pretty);
        assert_eq!(config.threads, Some(4));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_toml("[output]\nformat = \"svg\"").is_err());
    }

    #[test]
    fn flags_override_the_file() {
        let config = Config::from_toml("[solve]\ncandidates_per_building = 5").unwrap();
        let config = config.apply(Overrides {
            candidates: Some(2),
            backbone: true,
            threads: Some(1),
            ..Overrides::default()
        });
        assert_eq!(config.solve.candidates_per_building, 2);
        assert!(config.solve.backbone);
        assert!(!config.output.wgs84);
        assert_eq!(config.threads, Some(1));
    }
}
