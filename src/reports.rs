use crate::aggregate::{
    group_sum, percent_pivot, series_cagr, summarize, top_n, value_counts, yoy_change,
    AggregationResult,
};
use crate::error::DomainError;
use crate::output::markdown_table;
use crate::series::{age_profile, gender_breakdown};
use crate::types::{
    Dataset, Dimension, Gender, GroupRow, KeyValue, Measure, MetricRow, OriginRow, ShareRow,
    TrendRow,
};
use crate::util::{format_int, format_number, format_percent};
use tabled::{builder::Builder, settings::Style};

/// Dashboard pages. Each one maps to a fixed set of queries in [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Page {
    Overview,
    Trends,
    Locations,
    Demographics,
    Settlement,
    Categories,
    Origins,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Overview,
        Page::Trends,
        Page::Locations,
        Page::Demographics,
        Page::Settlement,
        Page::Categories,
        Page::Origins,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Trends => "Population Over Years",
            Page::Locations => "Top Locations by Population",
            Page::Demographics => "Gender and Age Breakdown",
            Page::Settlement => "Urban/Rural and Accommodation",
            Page::Categories => "Population Categories",
            Page::Origins => "Country of Origin vs Country of Asylum",
        }
    }
}

/// Render one page of the dashboard for an already-filtered dataset.
/// `top` bounds the location ranking; the origin table lists every pair.
pub fn render(page: Page, data: &Dataset, top: usize) -> Result<String, DomainError> {
    let mut out = format!("# {}\n\n", page.title());
    let body = match page {
        Page::Overview => overview(data),
        Page::Trends => trends(data)?,
        Page::Locations => locations(data, top),
        Page::Demographics => demographics(data),
        Page::Settlement => settlement(data),
        Page::Categories => categories(data)?,
        Page::Origins => origins(data),
    };
    out.push_str(&body);
    Ok(out)
}

fn section(out: &mut String, title: &str, table: &str) {
    out.push_str(&format!("## {title}\n\n{table}\n\n"));
}

fn group_rows(result: &AggregationResult) -> Vec<GroupRow> {
    result
        .iter()
        .map(|g| GroupRow {
            group: g.key.to_string(),
            value: format_number(g.value, 0),
        })
        .collect()
}

fn share_rows(series: &[(String, f64)]) -> Vec<ShareRow> {
    let total: f64 = series.iter().map(|(_, v)| v).sum();
    series
        .iter()
        .map(|(category, v)| ShareRow {
            category: category.clone(),
            value: format_number(*v, 0),
            share: format_percent((total > 0.0).then(|| v / total * 100.0)),
        })
        .collect()
}

fn overview(data: &Dataset) -> String {
    let s = summarize(data);
    let years = match (s.first_year, s.last_year) {
        (Some(a), Some(b)) if a == b => a.to_string(),
        (Some(a), Some(b)) => format!("{a}-{b}"),
        _ => "n/a".to_string(),
    };
    let rows = vec![
        MetricRow {
            metric: "Total People (Filtered)".to_string(),
            value: format_int(s.total_people),
        },
        MetricRow {
            metric: "Records".to_string(),
            value: format_int(s.records),
        },
        MetricRow {
            metric: "Unique Locations".to_string(),
            value: format_int(s.unique_locations),
        },
        MetricRow {
            metric: "Countries of Origin".to_string(),
            value: format_int(s.countries_of_origin),
        },
        MetricRow {
            metric: "Years".to_string(),
            value: years,
        },
    ];
    format!("{}\n", markdown_table(&rows))
}

fn trends(data: &Dataset) -> Result<String, DomainError> {
    let by_year = group_sum(data, &[Dimension::Year], Measure::Total);
    let rows: Vec<TrendRow> = yoy_change(&by_year)?
        .into_iter()
        .map(|p| TrendRow {
            year: p.year,
            total: format_number(p.value, 0),
            yoy_change: format_percent(p.change),
        })
        .collect();
    let mut out = String::new();
    section(&mut out, "Total by Year", &markdown_table(&rows));

    for s in series_cagr(&by_year)? {
        let line = match s.cagr {
            Ok(v) => format!("CAGR {}-{}: {}", s.first_year, s.last_year, format_percent(Some(v))),
            Err(e) => format!("CAGR unavailable: {e}"),
        };
        out.push_str(&line);
        out.push('\n');
    }

    let by_type = group_sum(data, &[Dimension::PopulationType, Dimension::Year], Measure::Total);
    let mut lines = Vec::new();
    for s in series_cagr(&by_type)? {
        let value = match s.cagr {
            Ok(v) => format_percent(Some(v)),
            Err(e) => format!("n/a ({e})"),
        };
        lines.push(GroupRow {
            group: s.series.to_string(),
            value,
        });
    }
    if !lines.is_empty() {
        out.push('\n');
        section(&mut out, "CAGR by Population Type", &markdown_table(&lines));
    }
    Ok(out)
}

fn locations(data: &Dataset, top: usize) -> String {
    let by_location = group_sum(data, &[Dimension::Location], Measure::Total);
    let ranked = top_n(&by_location, top);
    let mut out = String::new();
    section(
        &mut out,
        &format!("Top {top} Locations"),
        &markdown_table(&group_rows(&ranked)),
    );
    out
}

fn demographics(data: &Dataset) -> String {
    let mut out = String::new();
    section(
        &mut out,
        "Gender Breakdown",
        &markdown_table(&share_rows(&gender_breakdown(data))),
    );
    for gender in Gender::ALL {
        section(
            &mut out,
            &format!("{} by Age", gender.label()),
            &markdown_table(&share_rows(&age_profile(data, gender))),
        );
    }
    out
}

fn settlement(data: &Dataset) -> String {
    let mut out = String::new();
    section(
        &mut out,
        "Records by Urban/Rural",
        &markdown_table(&group_rows(&value_counts(data, Dimension::UrbanRural))),
    );
    section(
        &mut out,
        "Records by Accommodation Type",
        &markdown_table(&group_rows(&value_counts(data, Dimension::AccommodationType))),
    );
    out
}

fn categories(data: &Dataset) -> Result<String, DomainError> {
    let mut out = String::new();
    section(
        &mut out,
        "Records by Population Type",
        &markdown_table(&group_rows(&value_counts(data, Dimension::PopulationType))),
    );

    let by_year_type = group_sum(
        data,
        &[Dimension::Year, Dimension::PopulationType],
        Measure::Total,
    );
    let pivot = percent_pivot(&by_year_type)?;
    if pivot.rows.is_empty() {
        section(&mut out, "Population Type Share by Year", "(no rows)");
        return Ok(out);
    }
    let mut builder = Builder::default();
    let mut header = vec![pivot.row_dimension.to_string()];
    header.extend(pivot.columns.iter().map(KeyValue::to_string));
    builder.push_record(header);
    for row in &pivot.rows {
        let mut record = vec![row.key.to_string()];
        record.extend(row.shares.iter().map(|s| format_percent(Some(*s))));
        builder.push_record(record);
    }
    let table = builder.build().with(Style::markdown()).to_string();
    section(&mut out, "Population Type Share by Year", &table);
    Ok(out)
}

fn origins(data: &Dataset) -> String {
    let pairs = group_sum(
        data,
        &[Dimension::CountryOfOrigin, Dimension::CountryOfAsylum],
        Measure::Total,
    );
    let rows: Vec<OriginRow> = top_n(&pairs, pairs.len())
        .iter()
        .filter_map(|g| match g.key.parts() {
            [origin, asylum] => Some(OriginRow {
                origin: origin.to_string(),
                asylum: asylum.to_string(),
                total: format_number(g.value, 0),
            }),
            _ => None,
        })
        .collect();
    let mut out = String::new();
    section(&mut out, "Origin / Asylum Totals", &markdown_table(&rows));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Demographics, Record};

    fn rec(year: i32, pop: &str, loc: &str, total: u64) -> Record {
        let mut demographics = Demographics::default();
        demographics.female.total = total / 2;
        demographics.male.total = total - total / 2;
        Record {
            year,
            population_type: pop.to_string(),
            location: loc.to_string(),
            urban_rural: "Urban".to_string(),
            accommodation_type: "Camp".to_string(),
            country_of_origin: "Sri Lanka".to_string(),
            country_of_asylum: "Sri Lanka".to_string(),
            total,
            demographics,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            rec(2020, "IDP", "Jaffna", 100),
            rec(2021, "IDP", "Jaffna", 150),
            rec(2021, "RET", "Kandy", 1000),
        ])
    }

    #[test]
    fn every_page_renders() {
        let data = sample();
        for page in Page::ALL {
            let text = render(page, &data, 10).unwrap();
            assert!(text.starts_with(&format!("# {}", page.title())), "{text}");
        }
    }

    #[test]
    fn every_page_renders_empty_data() {
        for page in Page::ALL {
            assert!(render(page, &Dataset::empty(), 10).is_ok());
        }
    }

    #[test]
    fn overview_formats_thousands() {
        let text = render(Page::Overview, &sample(), 10).unwrap();
        assert!(text.contains("1,250"), "{text}");
        assert!(text.contains("2020-2021"), "{text}");
    }

    #[test]
    fn trends_show_yoy_and_cagr() {
        let text = render(Page::Trends, &sample(), 10).unwrap();
        assert!(text.contains("n/a"), "{text}");
        assert!(text.contains("1,050.00%"), "{text}");
        assert!(text.contains("CAGR 2020-2021"), "{text}");
        assert!(text.contains("RET"), "{text}");
    }

    #[test]
    fn locations_respect_top() {
        let text = render(Page::Locations, &sample(), 1).unwrap();
        assert!(text.contains("Kandy"));
        assert!(!text.contains("Jaffna"));
    }

    #[test]
    fn origins_list_every_pair_largest_first() {
        let mut records: Vec<Record> = (0..4u64)
            .map(|i| rec(2020, "REF", "Jaffna", 10 * (i + 1)))
            .collect();
        for (r, origin) in records.iter_mut().zip(["India", "Myanmar", "Pakistan", "Iran"]) {
            r.country_of_origin = origin.to_string();
        }
        let text = render(Page::Origins, &Dataset::new(records), 1).unwrap();
        let pos = |name: &str| text.find(name).unwrap();
        assert!(pos("Iran") < pos("Pakistan"), "{text}");
        assert!(pos("Pakistan") < pos("Myanmar"), "{text}");
        assert!(pos("Myanmar") < pos("India"), "{text}");
    }

    #[test]
    fn settlement_counts_merge_case_variants() {
        let mut records = vec![
            rec(2020, "IDP", "Jaffna", 10),
            rec(2021, "IDP", "Jaffna", 10),
        ];
        records[1].urban_rural = "urban".to_string();
        let text = render(Page::Settlement, &Dataset::new(records), 10).unwrap();
        assert!(text.contains("| Urban | 2 "), "{text}");
        assert!(!text.contains("| urban"), "{text}");
    }

    #[test]
    fn categories_pivot_has_type_columns() {
        let text = render(Page::Categories, &sample(), 10).unwrap();
        assert!(text.contains("| Year"), "{text}");
        assert!(text.contains("100.00%"), "{text}");
    }
}
