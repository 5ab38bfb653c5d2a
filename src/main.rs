use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use tallydb::config::AppConfig;
use tallydb::ingestion::{classify, parse_range_text, parse_value, Role, StaticRoster};
use tallydb::metrics;
use tallydb::query::{current_month_range, RangeBounds, ReportAggregator};
use tallydb::storage::TimeSeriesStore;

const USAGE: &str = "usage: tallydb <config.json> <caller-id> <command>
commands:
  add <value>                        append a value to the caller's entity (writers)
  report [<DD.MM.YYYY-DD.MM.YYYY>]   caller's records (writers) or consolidated report (readers)
  sums <DD.MM.YYYY-DD.MM.YYYY>       per-entity sums (readers)
  stats                              record counts per entity (readers)";

#[tokio::main]
async fn main() {
    // Initialize logging; stdout carries the JSON results
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .pretty()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let [config_path, caller, command, rest @ ..] = args else {
        return Err(USAGE.into());
    };

    let config = AppConfig::from_file(config_path)?;
    info!(path = %config_path, "Loaded config");

    // Initialize metrics
    if let Some(addr) = config.metrics_addr {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Metrics server listening on {}", addr),
            Err(e) => warn!("Failed to initialize metrics: {}", e),
        }
    }

    let roster = StaticRoster::new(config.writers.iter().cloned(), config.readers.iter().cloned());
    let Some(role) = classify(&roster, caller) else {
        warn!(caller = %caller, "Caller is neither a writer nor a reader");
        return Err(format!("{} is not allowed to use tallydb", caller).into());
    };

    let store = TimeSeriesStore::open(config.database.clone()).await?;
    let reports = ReportAggregator::new(store.clone(), config.directory.clone());

    match (role, command.as_str(), rest) {
        (Role::Writer, "add", [value]) => {
            let value = parse_value(value)?;
            store.append(caller, value, Local::now().naive_local()).await?;
            info!(caller = %caller, value, "Value saved");
            print_json(&serde_json::json!({ "entity_id": caller, "value": value }))
        }
        (Role::Writer, "report", range) => {
            let bounds = requested_range(range)?;
            print_json(&reports.entity_report(caller, &bounds).await?)
        }
        (Role::Reader, "report", range) => {
            let bounds = requested_range(range)?;
            print_json(&reports.consolidated_report(&bounds).await?)
        }
        (Role::Reader, "sums", [range]) => {
            info!(caller = %caller, range = %range, "Sums requested");
            print_json(&reports.sum_all_entities_in(range).await?)
        }
        (Role::Reader, "stats", []) => {
            let mut counts = BTreeMap::new();
            for entity_id in store.list_entities().await? {
                let count = store.count_records(&entity_id).await?;
                counts.insert(entity_id, count);
            }
            print_json(&counts)
        }
        _ => {
            warn!(caller = %caller, command = %command, "Command not available to caller");
            Err(format!("{} is not available to {}\n{}", command, caller, USAGE).into())
        }
    }
}

/// An explicit `DD.MM.YYYY-DD.MM.YYYY` range, or the current month so far
fn requested_range(args: &[String]) -> Result<RangeBounds, Box<dyn Error>> {
    match args {
        [] => Ok(current_month_range(Local::now().date_naive())),
        [range] => Ok(parse_range_text(range)?),
        _ => Err(USAGE.into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
