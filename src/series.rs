//! Reshape wide demographic columns into chart series.

use crate::aggregate::Spellings;
use crate::error::SchemaError;
use crate::schema::Column;
use crate::types::{
    AgeBracket, BreakdownPart, Dataset, DemographicColumn, Dimension, Gender, KeyValue, Record,
};
use crate::util::saturating_sum;
use std::collections::BTreeMap;

/// One `(category, value)` pair of a long-form series.
pub type LongForm = Vec<(String, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct StackedMatrix {
    pub row_dimension: Dimension,
    pub rows: Vec<KeyValue>,
    pub categories: Vec<String>,
    /// `values[row][category]`.
    pub values: Vec<Vec<f64>>,
}

/// A resolved wide column and the category label it contributes.
struct WideColumn {
    label: String,
    column: Column,
}

fn column_value(column: Column, r: &Record) -> u64 {
    match column {
        Column::Total => r.total,
        Column::Demographic(d) => d.value(&r.demographics),
        _ => 0,
    }
}

/// Resolve names, derive labels and put age brackets in canonical order.
/// Labels that are not age brackets keep their input order after the ages.
fn resolve<S: AsRef<str>>(
    wide_columns: &[S],
    label_prefix: &str,
) -> Result<Vec<WideColumn>, SchemaError> {
    let mut ranked = Vec::with_capacity(wide_columns.len());
    for (pos, name) in wide_columns.iter().enumerate() {
        let name = name.as_ref();
        let column = Column::parse(name)?;
        if !matches!(column, Column::Total | Column::Demographic(_)) {
            return Err(SchemaError::NotAMeasure {
                name: name.to_string(),
            });
        }
        let canonical = column.label();
        let label = canonical
            .strip_prefix(label_prefix)
            .or_else(|| name.trim().strip_prefix(label_prefix))
            .unwrap_or(name.trim())
            .trim()
            .to_string();
        let rank = match AgeBracket::from_label(&label) {
            Some(b) => (0, b as usize),
            None => (1, pos),
        };
        ranked.push((rank, WideColumn { label, column }));
    }
    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, c)| c).collect())
}

/// Sum each wide column over the dataset and pair it with its label.
///
/// `["Male 60 or more", "Male 0-4"]` with prefix `"Male "` yields
/// `[("0-4", ..), ("60 or more", ..)]`.
pub fn to_long_form<S: AsRef<str>>(
    dataset: &Dataset,
    wide_columns: &[S],
    label_prefix: &str,
) -> Result<LongForm, SchemaError> {
    let columns = resolve(wide_columns, label_prefix)?;
    Ok(columns
        .into_iter()
        .map(|c| {
            let sum = saturating_sum(dataset.iter().map(|r| column_value(c.column, r)));
            (c.label, sum as f64)
        })
        .collect())
}

/// Sums of the wide columns per value of `row_dim`, for stacked bars.
pub fn stacked_matrix<S: AsRef<str>>(
    dataset: &Dataset,
    row_dim: Dimension,
    wide_columns: &[S],
    label_prefix: &str,
) -> Result<StackedMatrix, SchemaError> {
    let columns = resolve(wide_columns, label_prefix)?;
    let mut spellings = Spellings::default();
    let mut acc: BTreeMap<KeyValue, Vec<u64>> = BTreeMap::new();
    for r in dataset {
        let row = acc
            .entry(spellings.key(r, row_dim))
            .or_insert_with(|| vec![0; columns.len()]);
        for (slot, c) in row.iter_mut().zip(&columns) {
            *slot = slot.saturating_add(column_value(c.column, r));
        }
    }
    let (rows, values): (Vec<KeyValue>, Vec<Vec<f64>>) = acc
        .into_iter()
        .map(|(k, v)| {
            let v = v.into_iter().map(|x| x as f64).collect::<Vec<f64>>();
            (spellings.display(k), v)
        })
        .unzip();
    Ok(StackedMatrix {
        row_dimension: row_dim,
        rows,
        categories: columns.into_iter().map(|c| c.label).collect(),
        values,
    })
}

/// Gender totals and unknowns, labelled with their full column names.
pub fn gender_breakdown(dataset: &Dataset) -> LongForm {
    let cols = [
        DemographicColumn::new(Gender::Female, BreakdownPart::Total),
        DemographicColumn::new(Gender::Male, BreakdownPart::Total),
        DemographicColumn::new(Gender::Female, BreakdownPart::Unknown),
        DemographicColumn::new(Gender::Male, BreakdownPart::Unknown),
    ];
    cols.into_iter()
        .map(|c| {
            let sum = saturating_sum(dataset.iter().map(|r| c.value(&r.demographics)));
            (c.label(), sum as f64)
        })
        .collect()
}

/// Age-bracket counts for one gender, in canonical order.
pub fn age_profile(dataset: &Dataset, gender: Gender) -> LongForm {
    AgeBracket::ALL
        .into_iter()
        .map(|b| {
            let c = DemographicColumn::new(gender, BreakdownPart::Age(b));
            let sum = saturating_sum(dataset.iter().map(|r| c.value(&r.demographics)));
            (b.label().to_string(), sum as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Demographics;

    fn rec(year: i32, male_0_4: u64, male_60: u64) -> Record {
        let mut demographics = Demographics::default();
        demographics.male.ages = [male_0_4, 0, 0, 0, male_60];
        demographics.male.total = male_0_4 + male_60;
        demographics.female.total = 3;
        demographics.female.unknown = 1;
        Record {
            year,
            population_type: "IDP".to_string(),
            location: "Jaffna".to_string(),
            urban_rural: "Urban".to_string(),
            accommodation_type: "Camp".to_string(),
            country_of_origin: "Sri Lanka".to_string(),
            country_of_asylum: "Sri Lanka".to_string(),
            total: male_0_4 + male_60 + 3,
            demographics,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![rec(2020, 1, 2), rec(2021, 10, 20)])
    }

    #[test]
    fn long_form_uses_canonical_age_order() {
        let out = to_long_form(&sample(), &["Male 60 or more", "Male 0-4"], "Male ").unwrap();
        assert_eq!(
            out,
            vec![("0-4".to_string(), 11.0), ("60 or more".to_string(), 22.0)]
        );
    }

    #[test]
    fn non_age_labels_follow_ages_in_input_order() {
        let out = to_long_form(
            &sample(),
            &["Male Unknown", "Male Total", "Male 5-11"],
            "Male ",
        )
        .unwrap();
        let labels: Vec<&str> = out.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["5-11", "Unknown", "Total"]);
    }

    #[test]
    fn accepts_normalized_column_names() {
        let out = to_long_form(&sample(), &["male_0_4"], "Male ").unwrap();
        assert_eq!(out, vec![("0-4".to_string(), 11.0)]);
    }

    #[test]
    fn unknown_or_categorical_columns_are_rejected() {
        assert_eq!(
            to_long_form(&sample(), &["Male 99+"], "Male "),
            Err(SchemaError::UnknownColumn {
                name: "Male 99+".to_string()
            })
        );
        assert!(matches!(
            to_long_form(&sample(), &["location"], ""),
            Err(SchemaError::NotAMeasure { .. })
        ));
    }

    #[test]
    fn stacked_matrix_by_year() {
        let m = stacked_matrix(
            &sample(),
            Dimension::Year,
            &["Male 60 or more", "Male 0-4"],
            "Male ",
        )
        .unwrap();
        assert_eq!(m.rows, vec![KeyValue::Year(2020), KeyValue::Year(2021)]);
        assert_eq!(m.categories, vec!["0-4", "60 or more"]);
        assert_eq!(m.values, vec![vec![1.0, 2.0], vec![10.0, 20.0]]);
    }

    #[test]
    fn stacked_rows_merge_case_variants() {
        let mut a = rec(2020, 1, 2);
        let mut b = rec(2021, 10, 20);
        a.urban_rural = "Rural".to_string();
        b.urban_rural = " rural".to_string();
        let m = stacked_matrix(
            &Dataset::new(vec![a, b]),
            Dimension::UrbanRural,
            &["Male 0-4"],
            "Male ",
        )
        .unwrap();
        assert_eq!(m.rows, vec![KeyValue::Text("Rural".into())]);
        assert_eq!(m.values, vec![vec![11.0]]);
    }

    #[test]
    fn gender_breakdown_sums_totals_and_unknowns() {
        let out = gender_breakdown(&sample());
        assert_eq!(out[0], ("Female Total".to_string(), 6.0));
        assert_eq!(out[1], ("Male Total".to_string(), 33.0));
        assert_eq!(out[2], ("Female Unknown".to_string(), 2.0));
        assert_eq!(out[3], ("Male Unknown".to_string(), 0.0));
    }

    #[test]
    fn age_profile_covers_every_bracket() {
        let out = age_profile(&sample(), Gender::Male);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0].1, 11.0);
        assert_eq!(out[4], ("60 or more".to_string(), 22.0));
    }
}
