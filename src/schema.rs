//! Canonical column schema.
//!
//! Deployments of the dataset disagree on header spelling (`Population Type`
//! vs `population_type`, `urbanRural` vs `Urban Rural`). Every header is
//! normalized here once at load time, and the rest of the crate only ever
//! sees [`Column`] values.

use crate::error::SchemaError;
use crate::types::{BreakdownPart, DemographicColumn, Gender};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Year,
    PopulationType,
    Location,
    UrbanRural,
    AccommodationType,
    CountryOfOrigin,
    CountryOfAsylum,
    Total,
    Demographic(DemographicColumn),
}

impl Column {
    /// All columns in canonical (export) order.
    pub fn all() -> Vec<Column> {
        let mut cols = vec![
            Column::Year,
            Column::PopulationType,
            Column::Location,
            Column::UrbanRural,
            Column::AccommodationType,
            Column::CountryOfOrigin,
            Column::CountryOfAsylum,
            Column::Total,
        ];
        cols.extend(DemographicColumn::all().map(Column::Demographic));
        cols
    }

    /// Columns that must be present for the dashboard to work at all. The
    /// remaining columns default to zero / `Unknown` when absent.
    pub fn is_required(self) -> bool {
        match self {
            Column::Year
            | Column::PopulationType
            | Column::Location
            | Column::UrbanRural
            | Column::AccommodationType
            | Column::Total => true,
            Column::Demographic(d) => d.part == BreakdownPart::Total,
            Column::CountryOfOrigin | Column::CountryOfAsylum => false,
        }
    }

    /// Canonical snake_case name.
    pub fn name(self) -> String {
        match self {
            Column::Year => "year".to_string(),
            Column::PopulationType => "population_type".to_string(),
            Column::Location => "location".to_string(),
            Column::UrbanRural => "urban_rural".to_string(),
            Column::AccommodationType => "accommodation_type".to_string(),
            Column::CountryOfOrigin => "country_of_origin".to_string(),
            Column::CountryOfAsylum => "country_of_asylum".to_string(),
            Column::Total => "total".to_string(),
            Column::Demographic(d) => normalize_header(&d.label()),
        }
    }

    /// Header as it appears in the published dataset. Used for exports.
    pub fn label(self) -> String {
        match self {
            Column::Year => "Year".to_string(),
            Column::PopulationType => "Population Type".to_string(),
            Column::Location => "location".to_string(),
            Column::UrbanRural => "urbanRural".to_string(),
            Column::AccommodationType => "accommodationType".to_string(),
            Column::CountryOfOrigin => "Country of Origin Name".to_string(),
            Column::CountryOfAsylum => "Country of Asylum Name".to_string(),
            Column::Total => "Total".to_string(),
            Column::Demographic(d) => d.label(),
        }
    }

    /// Resolve a raw header (any known spelling) to a column.
    pub fn from_header(raw: &str) -> Option<Column> {
        let name = normalize_header(raw);
        let aliased = match name.as_str() {
            "country_of_origin_name" | "origin" | "origin_country" => Some(Column::CountryOfOrigin),
            "country_of_asylum_name" | "asylum" | "asylum_country" => Some(Column::CountryOfAsylum),
            "pop_type" | "population" => Some(Column::PopulationType),
            "accommodation" => Some(Column::AccommodationType),
            "urban_or_rural" => Some(Column::UrbanRural),
            _ => None,
        };
        aliased.or_else(|| Column::all().into_iter().find(|c| c.name() == name))
    }

    /// Like [`Column::from_header`], but for names supplied by a caller.
    pub fn parse(name: &str) -> Result<Column, SchemaError> {
        Column::from_header(name).ok_or_else(|| SchemaError::UnknownColumn {
            name: name.to_string(),
        })
    }

    pub fn as_demographic(self) -> Option<DemographicColumn> {
        match self {
            Column::Demographic(d) => Some(d),
            _ => None,
        }
    }
}

/// Demographic column for `gender` and `part`, as a [`Column`].
pub fn demographic(gender: Gender, part: BreakdownPart) -> Column {
    Column::Demographic(DemographicColumn::new(gender, part))
}

/// Normalize a header to snake_case: `urbanRural` -> `urban_rural`,
/// `Female 60 or more` -> `female_60_or_more`, `Female 60+` -> `female_60_or_more`.
pub fn normalize_header(raw: &str) -> String {
    let raw = raw.trim().trim_start_matches('\u{feff}');
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev: Option<char> = None;
    for c in raw.chars() {
        if c == '+' {
            out.push_str("_or_more");
        } else if c.is_ascii_alphanumeric() {
            let boundary = c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push('_');
        }
        prev = Some(c);
    }
    let mut collapsed = String::with_capacity(out.len());
    for c in out.chars() {
        if c == '_' && (collapsed.is_empty() || collapsed.ends_with('_')) {
            continue;
        }
        collapsed.push(c);
    }
    while collapsed.ends_with('_') {
        collapsed.pop();
    }
    collapsed
}

/// Position of every recognized column in a concrete CSV header.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    positions: HashMap<Column, usize>,
    ignored: Vec<String>,
}

impl SchemaIndex {
    pub fn from_headers<'a, I>(headers: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions = HashMap::new();
        let mut ignored = Vec::new();
        for (idx, header) in headers.into_iter().enumerate() {
            match Column::from_header(header) {
                Some(col) => {
                    if positions.insert(col, idx).is_some() {
                        return Err(SchemaError::DuplicateColumn { column: col.name() });
                    }
                }
                None => {
                    debug!(header, "ignoring unrecognized column");
                    ignored.push(header.to_string());
                }
            }
        }

        let missing: Vec<String> = Column::all()
            .into_iter()
            .filter(|c| c.is_required() && !positions.contains_key(c))
            .map(Column::name)
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns { columns: missing });
        }
        Ok(Self { positions, ignored })
    }

    pub fn position(&self, col: Column) -> Option<usize> {
        self.positions.get(&col).copied()
    }

    /// Source headers that did not map to any canonical column.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgeBracket;

    #[test]
    fn normalizes_header_variants() {
        assert_eq!(normalize_header("Population Type"), "population_type");
        assert_eq!(normalize_header("population_type"), "population_type");
        assert_eq!(normalize_header("urbanRural"), "urban_rural");
        assert_eq!(normalize_header(" Urban Rural "), "urban_rural");
        assert_eq!(normalize_header("Female 60 or more"), "female_60_or_more");
        assert_eq!(normalize_header("Female 60+"), "female_60_or_more");
        assert_eq!(normalize_header("Male 0-4"), "male_0_4");
        assert_eq!(normalize_header("\u{feff}Year"), "year");
    }

    #[test]
    fn resolves_aliases() {
        assert_eq!(
            Column::from_header("Country of Origin Name"),
            Some(Column::CountryOfOrigin)
        );
        assert_eq!(
            Column::from_header("accommodationType"),
            Some(Column::AccommodationType)
        );
        assert_eq!(
            Column::from_header("Male 18-59"),
            Some(demographic(
                Gender::Male,
                BreakdownPart::Age(AgeBracket::From18To59)
            ))
        );
        assert_eq!(Column::from_header("PopType_ASY"), None);
    }

    #[test]
    fn every_label_round_trips() {
        for col in Column::all() {
            assert_eq!(Column::from_header(&col.label()), Some(col), "{}", col.label());
            assert_eq!(Column::from_header(&col.name()), Some(col), "{}", col.name());
        }
    }

    #[test]
    fn reports_all_missing_required_columns() {
        let err = SchemaIndex::from_headers(["Year", "location"]).unwrap_err();
        let SchemaError::MissingColumns { columns } = err else {
            panic!("expected missing columns");
        };
        assert!(columns.contains(&"population_type".to_string()));
        assert!(columns.contains(&"total".to_string()));
        assert!(columns.contains(&"male_total".to_string()));
        assert!(!columns.contains(&"year".to_string()));
    }

    #[test]
    fn rejects_duplicate_after_normalization() {
        let headers = ["Year", "year"];
        let err = SchemaIndex::from_headers(headers).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateColumn {
                column: "year".to_string()
            }
        );
    }

    #[test]
    fn keeps_unknown_columns_aside() {
        let headers = [
            "Year",
            "Population Type",
            "location",
            "urbanRural",
            "accommodationType",
            "Total",
            "Female Total",
            "Male Total",
            "PopType_IDP",
        ];
        let index = SchemaIndex::from_headers(headers).unwrap();
        assert_eq!(index.position(Column::Total), Some(5));
        assert_eq!(index.position(Column::CountryOfOrigin), None);
        assert_eq!(index.ignored(), ["PopType_IDP".to_string()]);
    }
}
