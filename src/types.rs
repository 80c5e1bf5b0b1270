use crate::util::saturating_sum;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

/// Age brackets in the order charts expect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBracket {
    Under5,
    From5To11,
    From12To17,
    From18To59,
    Over59,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 5] = [
        AgeBracket::Under5,
        AgeBracket::From5To11,
        AgeBracket::From12To17,
        AgeBracket::From18To59,
        AgeBracket::Over59,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeBracket::Under5 => "0-4",
            AgeBracket::From5To11 => "5-11",
            AgeBracket::From12To17 => "12-17",
            AgeBracket::From18To59 => "18-59",
            AgeBracket::Over59 => "60 or more",
        }
    }

    pub fn from_label(label: &str) -> Option<AgeBracket> {
        let label = label.trim();
        AgeBracket::ALL
            .into_iter()
            .find(|b| b.label().eq_ignore_ascii_case(label))
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One slot of a per-gender breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BreakdownPart {
    Age(AgeBracket),
    Unknown,
    Total,
}

impl BreakdownPart {
    pub fn label(self) -> &'static str {
        match self {
            BreakdownPart::Age(b) => b.label(),
            BreakdownPart::Unknown => "Unknown",
            BreakdownPart::Total => "Total",
        }
    }
}

/// A demographic count column such as `Female 18-59` or `Male Total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DemographicColumn {
    pub gender: Gender,
    pub part: BreakdownPart,
}

impl DemographicColumn {
    pub const fn new(gender: Gender, part: BreakdownPart) -> Self {
        Self { gender, part }
    }

    /// Every demographic column, gender-major, age brackets first.
    pub fn all() -> impl Iterator<Item = DemographicColumn> {
        Gender::ALL.into_iter().flat_map(|gender| {
            AgeBracket::ALL
                .into_iter()
                .map(BreakdownPart::Age)
                .chain([BreakdownPart::Unknown, BreakdownPart::Total])
                .map(move |part| DemographicColumn::new(gender, part))
        })
    }

    pub fn label(self) -> String {
        format!("{} {}", self.gender.label(), self.part.label())
    }

    pub fn value(self, d: &Demographics) -> u64 {
        let g = d.get(self.gender);
        match self.part {
            BreakdownPart::Age(b) => g.ages[b.index()],
            BreakdownPart::Unknown => g.unknown,
            BreakdownPart::Total => g.total,
        }
    }

    pub(crate) fn set(self, d: &mut Demographics, value: u64) {
        let g = d.get_mut(self.gender);
        match self.part {
            BreakdownPart::Age(b) => g.ages[b.index()] = value,
            BreakdownPart::Unknown => g.unknown = value,
            BreakdownPart::Total => g.total = value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenderBreakdown {
    pub ages: [u64; 5],
    pub unknown: u64,
    pub total: u64,
}

impl GenderBreakdown {
    pub fn age(&self, bracket: AgeBracket) -> u64 {
        self.ages[bracket.index()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demographics {
    pub female: GenderBreakdown,
    pub male: GenderBreakdown,
}

impl Demographics {
    pub fn get(&self, gender: Gender) -> &GenderBreakdown {
        match gender {
            Gender::Female => &self.female,
            Gender::Male => &self.male,
        }
    }

    fn get_mut(&mut self, gender: Gender) -> &mut GenderBreakdown {
        match gender {
            Gender::Female => &mut self.female,
            Gender::Male => &mut self.male,
        }
    }
}

/// One row of the dataset, already in the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub year: i32,
    pub population_type: String,
    pub location: String,
    pub urban_rural: String,
    pub accommodation_type: String,
    pub country_of_origin: String,
    pub country_of_asylum: String,
    pub total: u64,
    pub demographics: Demographics,
}

impl Record {
    /// Returns `Some(gender_sum)` when `total` disagrees with the gender totals.
    pub fn gender_mismatch(&self) -> Option<u64> {
        let sum = self
            .demographics
            .female
            .total
            .saturating_add(self.demographics.male.total);
        (sum != self.total).then_some(sum)
    }

    /// The categorical text for `dim`, or `None` for the year dimension.
    pub fn text(&self, dim: Dimension) -> Option<&str> {
        let s = match dim {
            Dimension::Year => return None,
            Dimension::PopulationType => &self.population_type,
            Dimension::Location => &self.location,
            Dimension::UrbanRural => &self.urban_rural,
            Dimension::AccommodationType => &self.accommodation_type,
            Dimension::CountryOfOrigin => &self.country_of_origin,
            Dimension::CountryOfAsylum => &self.country_of_asylum,
        };
        Some(s.as_str())
    }
}

/// Immutable, cheaply cloneable collection of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    records: Arc<[Record]>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Sum of the `total` column.
    pub fn total(&self) -> u64 {
        saturating_sum(self.records.iter().map(|r| r.total))
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Sidebar filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Facet {
    Year,
    PopulationType,
    UrbanRural,
    AccommodationType,
    Location,
}

impl Facet {
    pub const ALL: [Facet; 5] = [
        Facet::Year,
        Facet::PopulationType,
        Facet::UrbanRural,
        Facet::AccommodationType,
        Facet::Location,
    ];
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Facet::Year => "year",
            Facet::PopulationType => "population type",
            Facet::UrbanRural => "urban/rural",
            Facet::AccommodationType => "accommodation type",
            Facet::Location => "location",
        })
    }
}

/// Anything a result can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Year,
    PopulationType,
    Location,
    UrbanRural,
    AccommodationType,
    CountryOfOrigin,
    CountryOfAsylum,
}

impl From<Facet> for Dimension {
    fn from(f: Facet) -> Self {
        match f {
            Facet::Year => Dimension::Year,
            Facet::PopulationType => Dimension::PopulationType,
            Facet::UrbanRural => Dimension::UrbanRural,
            Facet::AccommodationType => Dimension::AccommodationType,
            Facet::Location => Dimension::Location,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Year => "Year",
            Dimension::PopulationType => "Population Type",
            Dimension::Location => "Location",
            Dimension::UrbanRural => "Urban/Rural",
            Dimension::AccommodationType => "Accommodation Type",
            Dimension::CountryOfOrigin => "Country of Origin",
            Dimension::CountryOfAsylum => "Country of Asylum",
        })
    }
}

/// What a grouped query adds up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Total,
    Demographic(DemographicColumn),
}

impl Measure {
    pub fn value(self, r: &Record) -> u64 {
        match self {
            Measure::Total => r.total,
            Measure::Demographic(c) => c.value(&r.demographics),
        }
    }
}

/// One component of a group key. Years order numerically, text lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Year(i32),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Year(y) => write!(f, "{y}"),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(pub Vec<KeyValue>);

impl GroupKey {
    pub fn parts(&self) -> &[KeyValue] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

// Rendered rows for the console pages. Numbers are pre-formatted strings so
// the tables line up the same way the CSV exports do.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupRow {
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Total")]
    pub total: String,
    #[tabled(rename = "YoYChange")]
    pub yoy_change: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ShareRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Share")]
    pub share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OriginRow {
    #[tabled(rename = "Country of Origin")]
    pub origin: String,
    #[tabled(rename = "Country of Asylum")]
    pub asylum: String,
    #[tabled(rename = "Total")]
    pub total: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SummaryStats {
    pub total_people: u64,
    pub records: usize,
    pub unique_locations: usize,
    pub countries_of_origin: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}
