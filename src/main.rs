// Entry point and high-level CLI flow.
//
// Every invocation loads the CSV once, applies the selected filters and
// renders one view of the result:
// - `show` prints dashboard pages as markdown tables,
// - `summary` prints (and optionally saves) the headline numbers,
// - `export` writes the filtered rows back out as CSV,
// - `facets` lists the values available for one filter.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lka_dashboard::config::AppConfig;
use lka_dashboard::util::format_int;
use lka_dashboard::{
    aggregate, facet_values, filter, load_dataset, logging, output, reports, Dataset, Facet,
    FilterSpec, Page,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Displaced population statistics for Sri Lanka", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./dashboard.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Dataset CSV, overriding the configured path
    #[arg(short, long, value_name = "FILE", global = true)]
    data: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render dashboard pages (all pages when none is given)
    Show {
        #[arg(short, long, value_enum)]
        page: Option<Page>,
        /// Number of rows in ranking tables
        #[arg(long)]
        top: Option<usize>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print headline numbers for the filtered data
    Summary {
        /// Also write the summary as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Write the filtered rows as CSV
    Export {
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the selectable values of a filter
    Facets {
        #[arg(value_enum)]
        facet: Facet,
    },
}

/// Sidebar selections. A flag overrides the configured selection for its
/// facet; facets given to `--none` select nothing at all.
#[derive(Args, Default)]
struct FilterArgs {
    #[arg(long = "year", value_name = "YEAR")]
    years: Vec<i32>,
    #[arg(long = "population-type", value_name = "CODE")]
    population_types: Vec<String>,
    #[arg(long = "urban-rural", value_name = "VALUE")]
    urban_rural: Vec<String>,
    #[arg(long = "accommodation", value_name = "VALUE")]
    accommodation_types: Vec<String>,
    #[arg(long = "location", value_name = "NAME")]
    locations: Vec<String>,
    #[arg(long = "none", value_enum, value_name = "FACET")]
    none: Vec<Facet>,
}

impl FilterArgs {
    fn apply(&self, mut spec: FilterSpec) -> FilterSpec {
        if !self.years.is_empty() {
            spec = spec.years(self.years.iter().copied());
        }
        let text = [
            (Facet::PopulationType, &self.population_types),
            (Facet::UrbanRural, &self.urban_rural),
            (Facet::AccommodationType, &self.accommodation_types),
            (Facet::Location, &self.locations),
        ];
        for (facet, values) in text {
            if !values.is_empty() {
                spec = spec.select(facet, values);
            }
        }
        for facet in &self.none {
            spec = spec.select(*facet, Vec::<String>::new());
        }
        spec
    }
}

fn load(config: &AppConfig) -> Result<Dataset> {
    let (data, report) = load_dataset(&config.dataset)
        .with_context(|| format!("Failed to load dataset {:?}", config.dataset))?;
    println!(
        "Processing dataset... ({} rows loaded)",
        format_int(report.rows)
    );
    if report.total_mismatches > 0 {
        println!(
            "Note: {} rows have a Total that differs from Female Total + Male Total.",
            format_int(report.total_mismatches)
        );
    }
    println!();
    Ok(data)
}

/// Filter `data`, warning about explicitly empty selections.
fn apply_filters(config: &AppConfig, args: &FilterArgs, data: &Dataset) -> Dataset {
    let spec = args.apply(config.filters.to_spec());
    if let Err(e) = spec.validate() {
        eprintln!("Warning: {e}; showing an empty result.\n");
    }
    let filtered = filter(data, &spec);
    info!(rows = filtered.len(), "filters applied");
    filtered
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose).context("Failed to initialise logging")?;

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.dataset = data;
    }

    match &cli.command {
        Commands::Show {
            page,
            top,
            filters,
        } => {
            let data = load(&config)?;
            let filtered = apply_filters(&config, filters, &data);
            let top = top.unwrap_or(config.top_n);
            let pages = match page {
                Some(p) => vec![*p],
                None => Page::ALL.to_vec(),
            };
            for p in pages {
                match reports::render(p, &filtered, top) {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("Warning: {} page unavailable: {e}\n", p.title()),
                }
            }
        }
        Commands::Summary { json, filters } => {
            let data = load(&config)?;
            let filtered = apply_filters(&config, filters, &data);
            let summary = aggregate::summarize(&filtered);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if let Some(path) = json {
                output::write_json(path, &summary)
                    .map_err(|e| anyhow::anyhow!("Write error: {e}"))?;
                println!("(Summary saved to {})", path.display());
            }
        }
        Commands::Export { out, filters } => {
            let data = load(&config)?;
            let filtered = apply_filters(&config, filters, &data);
            let path = out.clone().unwrap_or_else(|| config.export.clone());
            output::export_csv(&path, &filtered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Exported {} rows to {}",
                format_int(filtered.len()),
                path.display()
            );
        }
        Commands::Facets { facet } => {
            let data = load(&config)?;
            for value in facet_values(&data, *facet) {
                println!("{value}");
            }
        }
    }

    Ok(())
}
