use std::io::{self, Write};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pair_screener::config::{Config, OutputFormat};
use pair_screener::display::{
    category_label, displayed_label, format_change, format_funding, format_price, format_volume,
    header_label, trend_arrow,
};
use pair_screener::error::Result;
use pair_screener::fetcher::HttpPairSource;
use pair_screener::screener::{Criteria, Screener, ViewState};
use pair_screener::types::{SortField, TradingPair};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let source = HttpPairSource::new(&cfg)?;
    info!("Fetching trading pairs from {}", source.url());

    let mut screener = Screener::new(cfg.criteria.clone());
    screener.load(&source).await;

    let criteria = screener.criteria().clone();
    info!(
        search = %criteria.search_text,
        category = %criteria.category_filter,
        change = %criteria.change_filter,
        min_price = ?criteria.min_price,
        min_volume = ?criteria.min_volume,
        sort = %criteria.sort_field,
        direction = %criteria.sort_direction,
        "Applying criteria"
    );

    let state = screener.view_state();
    let rows = screener.rows();
    let mut out = io::stdout().lock();

    match cfg.output {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            if state == ViewState::Empty {
                writeln!(out, "No pairs found")?;
            } else {
                write_table(&mut out, &rows, &criteria)?;
            }
            writeln!(out, "{}", displayed_label(rows.len()))?;
        }
    }
    Ok(())
}

const COLUMNS: [(&str, Option<SortField>, usize); 6] = [
    ("Symbol", None, 14),
    ("Category", None, 9),
    ("Price", Some(SortField::LastPrice), 16),
    ("24h%", Some(SortField::PriceChangePercent24h), 11),
    ("Volume $", Some(SortField::Volume24h), 20),
    ("Funding", Some(SortField::FundingRate), 12),
];

fn write_table(out: &mut impl Write, rows: &[&TradingPair], criteria: &Criteria) -> io::Result<()> {
    let header: Vec<String> = COLUMNS
        .iter()
        .map(|&(title, field, width)| {
            let label = match field {
                Some(f) => header_label(title, f, criteria.sort_field, criteria.sort_direction),
                None => title.to_string(),
            };
            format!("{label:<width$}")
        })
        .collect();
    writeln!(out, "{}", header.join(" ").trim_end())?;

    for pair in rows {
        writeln!(
            out,
            "{:<14} {:<9} {:>16} {:>11} {:>20} {:>12}",
            pair.symbol,
            category_label(&pair.category),
            format_price(pair),
            format!("{} {}", trend_arrow(pair), format_change(pair)),
            format_volume(pair),
            format_funding(pair),
        )?;
    }
    Ok(())
}
