use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing::{info, warn};

use searchable_core::reindex::BatchAction;
use searchable_core::{
    IndexStore, JsonRecordSet, Reindexer, SearchMode, SearchQueryBuilder, Searchable, SearchableConfig, SortDirection,
    SourceTable, SyncObserver,
};
use searchable_text::TantivyIndexStore;

const DEFAULT_RECORDS: &str = "fixtures";

struct Args {
    command: String,
    positional: Vec<String>,
    records: PathBuf,
    mode: Option<SearchMode>,
    direction: SortDirection,
    table: Option<String>,
}

fn usage(prog: &str, config: &SearchableConfig) -> ! {
    eprintln!("Usage: {prog} [--records <file-or-dir>] <command> [args...]");
    eprintln!("  {} <type> [id]", config.command_name("index"));
    eprintln!("  {} <type> [id]", config.command_name("unindex"));
    eprintln!("  search <type> <keywords...> [--mode <mode>] [--asc] [--table <name>]");
    eprintln!("  sql <type> <keywords...> [--mode <mode>] [--asc] [--table <name>]");
    std::process::exit(1);
}

fn parse_args(config: &SearchableConfig) -> anyhow::Result<Args> {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    let mut records = PathBuf::from(DEFAULT_RECORDS);
    let mut mode = None;
    let mut direction = SortDirection::Desc;
    let mut table = None;
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--records" | "-r" => { i += 1; records = PathBuf::from(args.get(i).context("--records requires a path")?); }
            "--mode" | "-m" => {
                i += 1;
                let raw = args.get(i).context("--mode requires a value")?;
                mode = SearchMode::parse_lenient(raw);
                if mode.is_none() { warn!(mode = raw.as_str(), "unknown search mode, using the engine default"); }
            }
            "--table" => { i += 1; table = Some(args.get(i).context("--table requires a name")?.clone()); }
            "--asc" => direction = SortDirection::Asc,
            "--desc" => direction = SortDirection::Desc,
            "--help" | "-h" => usage(&prog, config),
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }
    if rest.is_empty() { usage(&prog, config); }
    let command = rest.remove(0);
    Ok(Args { command, positional: rest, records, mode, direction, table })
}

/// The store plus whether it persists between runs.
fn open_store(config: &SearchableConfig) -> anyhow::Result<(TantivyIndexStore, bool)> {
    let path = config.store_path(&env::current_dir()?);
    match &path {
        Some(dir) => info!(path = %dir.display(), "using on-disk search index"),
        None => info!("db_connection not set, using an in-memory search index"),
    }
    Ok((TantivyIndexStore::open(path.as_deref())?, path.is_some()))
}

fn batch(config: &SearchableConfig, records: &Path, action: BatchAction, positional: &[String]) -> anyhow::Result<()> {
    let record_type = positional.first().context("missing record type")?;
    let id = positional.get(1).map(|s| s.parse::<u64>()).transpose().context("record id must be a number")?;
    let set = JsonRecordSet::load(records)?;
    let source = set.source(record_type)?;
    let (store, _) = open_store(config)?;
    let observer = SyncObserver::new(store);
    let report = Reindexer::new(&observer).with_progress(true).run(action, &source, id)?;
    let verb = match action { BatchAction::Index => "Indexed", BatchAction::Unindex => "Unindexed" };
    println!("✅ {verb} {} {record_type} records ({} rows in index)", report.processed, observer.store().count()?);
    Ok(())
}

fn search(config: &SearchableConfig, args: &Args) -> anyhow::Result<()> {
    let Some((record_type, keywords)) = args.positional.split_first() else { bail!("missing record type") };
    let keywords = keywords.join(" ");
    let set = JsonRecordSet::load(&args.records)?;
    let source = set.source(record_type)?;
    let (store, persistent) = open_store(config)?;
    let observer = SyncObserver::new(store);
    if !persistent {
        Reindexer::new(&observer).index_all(&source, None)?;
    }
    let table = args.table.clone().unwrap_or_else(|| record_type.clone());
    let query = SearchQueryBuilder::from_config(config)?
        .search(SourceTable::new(record_type.as_str(), table), &keywords, args.mode)
        .order(args.direction);
    let engine = observer.store().search_engine();
    let hits = query.execute(&engine, set.records(record_type))?;
    println!("🔍 Found {} {record_type} results for: \"{}\"", hits.len(), query.keywords);
    for (i, hit) in hits.iter().enumerate() {
        println!("  {}. score={:.4}  id={}  title={}", i + 1, hit.score, hit.record.record_id(), hit.record.index_title().trim());
    }
    Ok(())
}

fn sql(config: &SearchableConfig, args: &Args) -> anyhow::Result<()> {
    let Some((record_type, keywords)) = args.positional.split_first() else { bail!("missing record type") };
    let table = args.table.clone().unwrap_or_else(|| record_type.clone());
    let query = SearchQueryBuilder::from_config(config)?
        .search(SourceTable::new(record_type.as_str(), table), &keywords.join(" "), args.mode)
        .order(args.direction);
    let statement = query.to_sql();
    println!("{}", statement.sql);
    println!("-- bindings: {:?}", statement.bindings);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let config = SearchableConfig::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args = parse_args(&config)?;
    match args.command.as_str() {
        c if c == config.command_name("index") => batch(&config, &args.records, BatchAction::Index, &args.positional)?,
        c if c == config.command_name("unindex") => batch(&config, &args.records, BatchAction::Unindex, &args.positional)?,
        "search" => search(&config, &args)?,
        "sql" => sql(&config, &args)?,
        other => { eprintln!("Unknown command: {}", other); std::process::exit(1); }
    }
    Ok(())
}
