use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use music_trends::config::DashboardConfig;
use music_trends::dashboard::{Dashboard, DashboardViews};
use music_trends::data::filter::YearRange;
use music_trends::data::loader::load_file;

#[derive(Parser)]
#[command(
    name = music_trends::APP_NAME,
    version,
    about = "Genre, popularity-trend and energy/danceability views over a track dataset"
)]
struct Cli {
    /// Dataset to load (.csv, .tsv, .json, .parquet)
    dataset: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only include this genre (repeatable; none = every genre)
    #[arg(short, long = "genre")]
    genres: Vec<String>,

    /// First year to include
    #[arg(long)]
    from: Option<i64>,

    /// Last year to include
    #[arg(long)]
    to: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print the available genres and year range, then exit
    #[arg(long)]
    list_genres: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = cli
        .config
        .as_deref()
        .map(DashboardConfig::load)
        .unwrap_or_default();

    let path = config.resolve_dataset(cli.dataset);
    let table = load_file(&path, &config.load_options())
        .with_context(|| format!("Failed to load dataset {}", path.display()))?;
    let mut dashboard = Dashboard::new(Arc::new(table));

    let derived = dashboard.year_range().clone();
    if let Some(warning) = derived.warning() {
        for issue in &derived.issues {
            log::warn!("{issue}");
        }
        eprintln!("warning: {warning}");
    }

    if cli.list_genres {
        for genre in dashboard.table().genres() {
            println!("{genre}");
        }
        if let Some(r) = derived.bounds {
            println!();
            println!("years: {} - {}", r.min, r.max);
        }
        return Ok(());
    }

    // Selection: CLI > config > whole dataset
    let genres = if cli.genres.is_empty() {
        config.genres.clone()
    } else {
        cli.genres
    };
    if !genres.is_empty() {
        dashboard.set_genres(genres);
    }

    let current = dashboard.selection().year_range;
    let from = cli.from.or(config.year_from).unwrap_or(current.min);
    let to = cli.to.or(config.year_to).unwrap_or(current.max);
    if (from, to) != (current.min, current.max) {
        dashboard.set_year_range(YearRange::new(from, to));
    }

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(dashboard.views())
                .context("serializing views")?;
            println!("{json}");
        }
        OutputFormat::Text => print_report(dashboard.views()),
    }

    Ok(())
}

fn print_report(views: &DashboardViews) {
    println!(
        "{} of {} tracks match the current filters",
        views.visible_rows, views.total_rows
    );
    if views.is_empty() {
        return;
    }

    println!();
    println!("1. Tracks per genre");
    for c in &views.genre_counts {
        println!("  {:<24} {:>6}", c.genre, c.count);
    }

    if views.trend_available {
        println!();
        println!("2. Mean popularity per year");
        for p in &views.popularity_trend {
            println!("  {:<8} {:>8.2}", p.year, p.mean_popularity);
        }
    }

    println!();
    println!("3. Energy vs danceability");
    let (mean_energy, mean_dance) = views.relationship_means();
    println!(
        "  {} points, mean energy {:.3}, mean danceability {:.3}",
        views.relationship.len(),
        mean_energy,
        mean_dance
    );
}
