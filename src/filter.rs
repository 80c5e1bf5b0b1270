//! Facet filtering.
//!
//! A [`FilterSpec`] holds the sidebar selections explicitly; nothing here
//! reads global state. A facet that was never selected is unconstrained,
//! while a facet selected with no values matches nothing.

use crate::error::DomainError;
use crate::types::{Dataset, Dimension, Facet, KeyValue, Record};
use crate::util::{fold_value, parse_year};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    years: Option<BTreeSet<i32>>,
    /// Folded (trimmed, lowercased) values per categorical facet.
    text: BTreeMap<Facet, BTreeSet<String>>,
}

impl FilterSpec {
    /// A spec that constrains nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an exact set of years.
    pub fn years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = Some(years.into_iter().collect());
        self
    }

    /// Restrict `facet` to `values`. Year values that do not parse can never
    /// match and are dropped.
    pub fn select<I, S>(mut self, facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match facet {
            Facet::Year => {
                self.years = Some(
                    values
                        .into_iter()
                        .filter_map(|v| parse_year(v.as_ref()))
                        .collect(),
                );
            }
            _ => {
                let set = values.into_iter().map(|v| fold_value(v.as_ref())).collect();
                self.text.insert(facet, set);
            }
        }
        self
    }

    pub fn population_types<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.select(Facet::PopulationType, values)
    }

    pub fn urban_rural<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.select(Facet::UrbanRural, values)
    }

    pub fn accommodation_types<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.select(Facet::AccommodationType, values)
    }

    pub fn locations<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.select(Facet::Location, values)
    }

    pub fn is_constrained(&self, facet: Facet) -> bool {
        match facet {
            Facet::Year => self.years.is_some(),
            _ => self.text.contains_key(&facet),
        }
    }

    fn selection_is_empty(&self, facet: Facet) -> bool {
        match facet {
            Facet::Year => self.years.as_ref().is_some_and(BTreeSet::is_empty),
            _ => self.text.get(&facet).is_some_and(BTreeSet::is_empty),
        }
    }

    /// Reports the first facet that was explicitly selected with no values.
    /// Filtering still works on such a spec; it just matches nothing.
    pub fn validate(&self) -> Result<(), DomainError> {
        match Facet::ALL.into_iter().find(|f| self.selection_is_empty(*f)) {
            Some(facet) => Err(DomainError::EmptySelection(facet)),
            None => Ok(()),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(years) = &self.years {
            if !years.contains(&record.year) {
                return false;
            }
        }
        self.text.iter().all(|(facet, allowed)| {
            record
                .text(Dimension::from(*facet))
                .is_some_and(|v| allowed.contains(&fold_value(v)))
        })
    }
}

/// Keep the records matching every constrained facet of `spec`.
///
/// The input is never modified. No match yields an empty dataset.
pub fn filter(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    if spec == &FilterSpec::default() {
        return dataset.clone();
    }
    let kept: Vec<Record> = dataset
        .iter()
        .filter(|r| spec.matches(r))
        .cloned()
        .collect();
    debug!(before = dataset.len(), after = kept.len(), "filter applied");
    Dataset::new(kept)
}

/// Distinct values of `facet` in natural order, for building selection lists.
/// Values differing only in case or spacing are reported once, with the
/// spelling seen first.
pub fn facet_values(dataset: &Dataset, facet: Facet) -> Vec<KeyValue> {
    let dim = Dimension::from(facet);
    if facet == Facet::Year {
        let years: BTreeSet<i32> = dataset.iter().map(|r| r.year).collect();
        return years.into_iter().map(KeyValue::Year).collect();
    }
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for r in dataset {
        if let Some(v) = r.text(dim) {
            seen.entry(fold_value(v)).or_insert_with(|| v.to_string());
        }
    }
    seen.into_values().map(KeyValue::Text).collect()
}
