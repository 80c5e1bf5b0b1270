use crate::filter::FilterSpec;
use crate::types::Facet;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATASET: &str = "revised_demographics_residing_lka.csv";
pub const DEFAULT_EXPORT: &str = "filtered_sri_lanka_data.csv";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub dataset: PathBuf,
    pub export: PathBuf,
    pub top_n: usize,
    pub filters: FilterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET),
            export: PathBuf::from(DEFAULT_EXPORT),
            top_n: 10,
            filters: FilterConfig::default(),
        }
    }
}

/// Default selections. A facet left out is unconstrained; `[]` selects
/// nothing.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub year: Option<Vec<i32>>,
    pub population_type: Option<Vec<String>>,
    pub urban_rural: Option<Vec<String>>,
    pub accommodation_type: Option<Vec<String>>,
    pub location: Option<Vec<String>>,
}

impl FilterConfig {
    pub fn to_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::new();
        if let Some(years) = &self.year {
            spec = spec.years(years.iter().copied());
        }
        let text = [
            (Facet::PopulationType, &self.population_type),
            (Facet::UrbanRural, &self.urban_rural),
            (Facet::AccommodationType, &self.accommodation_type),
            (Facet::Location, &self.location),
        ];
        for (facet, values) in text {
            if let Some(values) = values {
                spec = spec.select(facet, values);
            }
        }
        spec
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Load `path` if given, else `dashboard.toml` when it exists, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => {
                let default = Path::new("dashboard.toml");
                if default.exists() {
                    Self::load_from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_partial_config() {
        let cfg: AppConfig = toml::from_str(
            r#"
            dataset = "data/lka.csv"
            top_n = 5

            [filters]
            year = [2020, 2021]
            population_type = ["IDP"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.dataset, PathBuf::from("data/lka.csv"));
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.export, PathBuf::from(DEFAULT_EXPORT));
        let spec = cfg.filters.to_spec();
        assert!(spec.is_constrained(Facet::Year));
        assert!(spec.is_constrained(Facet::PopulationType));
        assert!(!spec.is_constrained(Facet::Location));
    }

    #[test]
    fn empty_list_is_an_explicit_empty_selection() {
        let cfg: AppConfig = toml::from_str("[filters]\nlocation = []\n").unwrap();
        assert!(cfg.filters.to_spec().validate().is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<AppConfig>("colour = \"blue\"").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_n = 3").unwrap();
        let cfg = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(cfg.top_n, 3);
        assert_eq!(cfg.dataset, PathBuf::from(DEFAULT_DATASET));
    }
}
