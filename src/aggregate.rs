//! Grouped aggregates and the derived metrics the charts plot.
//!
//! Every function takes its input by reference and returns an owned result;
//! nothing here keeps a handle on the dataset.

use crate::error::DomainError;
use crate::types::{Dataset, Dimension, GroupKey, KeyValue, Measure, Record, SummaryStats};
use crate::util::fold_value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    /// Number of records in the group; the measure is ignored.
    Count,
    Mean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    pub value: f64,
}

/// Groups in ascending case-folded key order unless re-sorted (see [`top_n`]).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub dimensions: Vec<Dimension>,
    pub groups: Vec<Group>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Sum of every group's value.
    pub fn total(&self) -> f64 {
        self.groups.iter().map(|g| g.value).sum()
    }

    pub fn get(&self, key: &GroupKey) -> Option<f64> {
        self.groups.iter().find(|g| &g.key == key).map(|g| g.value)
    }
}

/// Case-folded grouping keys for one dimension. Values that differ only in
/// case or spacing share a key and are shown with the first spelling seen.
#[derive(Debug, Default)]
pub(crate) struct Spellings(BTreeMap<String, String>);

impl Spellings {
    pub(crate) fn key(&mut self, r: &Record, dim: Dimension) -> KeyValue {
        match r.text(dim) {
            Some(v) => {
                let folded = fold_value(v);
                self.0
                    .entry(folded.clone())
                    .or_insert_with(|| v.to_string());
                KeyValue::Text(folded)
            }
            None => KeyValue::Year(r.year),
        }
    }

    pub(crate) fn display(&self, key: KeyValue) -> KeyValue {
        match key {
            KeyValue::Text(folded) => match self.0.get(&folded) {
                Some(spelling) => KeyValue::Text(spelling.clone()),
                None => KeyValue::Text(folded),
            },
            year => year,
        }
    }
}

pub fn group_by(
    dataset: &Dataset,
    by: &[Dimension],
    measure: Measure,
    aggregate: Aggregate,
) -> AggregationResult {
    let mut spellings: Vec<Spellings> = by.iter().map(|_| Spellings::default()).collect();
    let mut acc: BTreeMap<Vec<KeyValue>, (u64, usize)> = BTreeMap::new();
    for r in dataset {
        let key = by
            .iter()
            .zip(spellings.iter_mut())
            .map(|(d, seen)| seen.key(r, *d))
            .collect();
        let e = acc.entry(key).or_insert((0, 0));
        e.0 = e.0.saturating_add(measure.value(r));
        e.1 += 1;
    }
    let groups = acc
        .into_iter()
        .map(|(folded, (sum, count))| {
            let key = GroupKey(
                folded
                    .into_iter()
                    .zip(&spellings)
                    .map(|(k, seen)| seen.display(k))
                    .collect(),
            );
            let value = match aggregate {
                Aggregate::Sum => sum as f64,
                Aggregate::Count => count as f64,
                Aggregate::Mean => sum as f64 / count as f64,
            };
            Group { key, value }
        })
        .collect();
    AggregationResult {
        dimensions: by.to_vec(),
        groups,
    }
}

/// Sum `measure` per distinct combination of the `by` dimensions.
pub fn group_sum(dataset: &Dataset, by: &[Dimension], measure: Measure) -> AggregationResult {
    group_by(dataset, by, measure, Aggregate::Sum)
}

/// Number of records per value of `dim`.
pub fn value_counts(dataset: &Dataset, dim: Dimension) -> AggregationResult {
    group_by(dataset, &[dim], Measure::Total, Aggregate::Count)
}

/// The `n` largest groups, largest first. Equal values are ordered by
/// ascending group key, so the cut-off is reproducible.
pub fn top_n(result: &AggregationResult, n: usize) -> AggregationResult {
    let mut groups = result.groups.clone();
    groups.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    groups.truncate(n);
    AggregationResult {
        dimensions: result.dimensions.clone(),
        groups,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub key: KeyValue,
    pub total: f64,
    /// Percent share per pivot column, aligned with [`PercentPivot::columns`].
    pub shares: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentPivot {
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    pub columns: Vec<KeyValue>,
    pub rows: Vec<PivotRow>,
}

/// Each cell's share of its row, in percent. The first grouping dimension
/// forms the rows. Rows with a zero total are all zeros.
pub fn percent_pivot(result: &AggregationResult) -> Result<PercentPivot, DomainError> {
    let [row_dimension, column_dimension] = result.dimensions[..] else {
        return Err(DomainError::PivotArity(result.dimensions.len()));
    };

    let mut columns: BTreeSet<KeyValue> = BTreeSet::new();
    let mut cells: BTreeMap<KeyValue, BTreeMap<KeyValue, f64>> = BTreeMap::new();
    for g in &result.groups {
        let [row, col] = g.key.parts() else {
            return Err(DomainError::PivotArity(g.key.parts().len()));
        };
        columns.insert(col.clone());
        *cells
            .entry(row.clone())
            .or_default()
            .entry(col.clone())
            .or_insert(0.0) += g.value;
    }

    let columns: Vec<KeyValue> = columns.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(key, row)| {
            let total: f64 = row.values().sum();
            let shares = columns
                .iter()
                .map(|c| {
                    let v = row.get(c).copied().unwrap_or(0.0);
                    if total > 0.0 {
                        v / total * 100.0
                    } else {
                        0.0
                    }
                })
                .collect();
            PivotRow { key, total, shares }
        })
        .collect();

    Ok(PercentPivot {
        row_dimension,
        column_dimension,
        columns,
        rows,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoyPoint {
    /// The group key without its year component.
    pub series: GroupKey,
    pub year: i32,
    pub value: f64,
    /// Percent change from the previous year in the series. `None` for the
    /// first year, and when the previous value is zero.
    pub change: Option<f64>,
}

/// Split a year-grouped result into per-series `(year, value)` lists in
/// ascending year order.
fn series_by_year(
    result: &AggregationResult,
) -> Result<BTreeMap<GroupKey, Vec<(i32, f64)>>, DomainError> {
    let year_pos = result
        .dimensions
        .iter()
        .position(|d| *d == Dimension::Year)
        .ok_or(DomainError::MissingYearDimension)?;

    let mut series: BTreeMap<GroupKey, Vec<(i32, f64)>> = BTreeMap::new();
    for g in &result.groups {
        let mut rest = g.key.0.clone();
        let KeyValue::Year(year) = rest.remove(year_pos) else {
            return Err(DomainError::MissingYearDimension);
        };
        series.entry(GroupKey(rest)).or_default().push((year, g.value));
    }
    for points in series.values_mut() {
        points.sort_by_key(|(year, _)| *year);
    }
    Ok(series)
}

/// Year-over-year percent change within each series of a year-grouped result.
pub fn yoy_change(result: &AggregationResult) -> Result<Vec<YoyPoint>, DomainError> {
    let mut out = Vec::new();
    for (series, points) in series_by_year(result)? {
        let mut prev: Option<f64> = None;
        for (year, value) in points {
            let change = match prev {
                Some(p) if p != 0.0 => Some((value - p) / p * 100.0),
                _ => None,
            };
            out.push(YoyPoint {
                series: series.clone(),
                year,
                value,
                change,
            });
            prev = Some(value);
        }
    }
    Ok(out)
}

/// Compound annual growth rate in percent.
///
/// Undefined unless both endpoints are positive and the span is at least one
/// year; those cases are errors rather than a silent zero.
pub fn cagr(start: f64, end: f64, years_span: u32) -> Result<f64, DomainError> {
    if start.is_nan() || start <= 0.0 {
        return Err(DomainError::NonPositiveStart(start));
    }
    if end.is_nan() || end <= 0.0 {
        return Err(DomainError::NonPositiveEnd(end));
    }
    if years_span == 0 {
        return Err(DomainError::ZeroSpan);
    }
    Ok(((end / start).powf(1.0 / f64::from(years_span)) - 1.0) * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesCagr {
    pub series: GroupKey,
    pub first_year: i32,
    pub last_year: i32,
    pub cagr: Result<f64, DomainError>,
}

/// CAGR between the first and last year of every series.
pub fn series_cagr(result: &AggregationResult) -> Result<Vec<SeriesCagr>, DomainError> {
    let mut out = Vec::new();
    for (series, points) in series_by_year(result)? {
        let (Some(&(first_year, start)), Some(&(last_year, end))) = (points.first(), points.last())
        else {
            continue;
        };
        let span = u32::try_from(last_year - first_year).unwrap_or(0);
        out.push(SeriesCagr {
            series,
            first_year,
            last_year,
            cagr: cagr(start, end, span),
        });
    }
    Ok(out)
}

/// Headline numbers for the overview cards.
pub fn summarize(dataset: &Dataset) -> SummaryStats {
    let locations: HashSet<String> = dataset.iter().map(|r| fold_value(&r.location)).collect();
    let origins: HashSet<String> = dataset
        .iter()
        .map(|r| fold_value(&r.country_of_origin))
        .collect();
    SummaryStats {
        total_people: dataset.total(),
        records: dataset.len(),
        unique_locations: locations.len(),
        countries_of_origin: origins.len(),
        first_year: dataset.iter().map(|r| r.year).min(),
        last_year: dataset.iter().map(|r| r.year).max(),
    }
}
