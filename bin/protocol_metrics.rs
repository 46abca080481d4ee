use std::io::{self, Write};

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{info, warn};
use simple_logger::SimpleLogger;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use protocol_metrics::{
    columns::unknown_identifiers, ChainSnapshot, ChainTable, ColumnStore, JsonFileColumnStore,
    Settings,
};

fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    SimpleLogger::new()
        .with_level(settings.logging.level_filter()?)
        .init()
        .context("Failed to install logger")?;

    let snapshot = ChainSnapshot::from_json_file(&settings.input.snapshot_path)?;
    info!(
        "Loaded {} snapshot: {} protocols, {} parents, {} chart points",
        snapshot.chain,
        snapshot.protocols.len(),
        snapshot.parent_protocols.len(),
        snapshot.tvl_chart.len()
    );

    let columns = JsonFileColumnStore::new(&settings.input.columns_path).load()?;
    for column in &columns {
        let unknown = unknown_identifiers(&column.formula);
        if !unknown.is_empty() {
            warn!(
                "Column {:?} references unknown fields: {}",
                column.name,
                unknown.join(", ")
            );
        }
    }

    let table = ChainTable::build(snapshot, &settings, &columns);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &table).context("Failed to write table")?;
    writeln!(out).context("Failed to write table")?;

    Ok(())
}
