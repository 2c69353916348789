use std::env;
use std::path::PathBuf;

use searchable_core::{FullTextEngine, MatchRequest, SearchMode, SearchQueryBuilder, SearchableConfig, SourceTable};
use searchable_text::TantivySearchEngine;
use tracing::warn;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <type> <keywords> [index_dir] [mode]", args[0]);
        eprintln!("Example: {} post '+rust -java' ./indexes/searchable boolean", args[0]);
        std::process::exit(1);
    }
    let config = SearchableConfig::load()?;
    let record_type = &args[1];
    let index_dir = args
        .get(3)
        .map(PathBuf::from)
        .or_else(|| config.store_path(&env::current_dir().unwrap_or_default()))
        .unwrap_or_else(|| PathBuf::from("indexes/searchable"));
    let mode = args.get(4).and_then(|raw| {
        let mode = SearchMode::parse_lenient(raw);
        if mode.is_none() { warn!(mode = raw.as_str(), "unknown search mode, using the engine default"); }
        mode
    });

    let query = SearchQueryBuilder::from_config(&config)?.search(SourceTable::new(record_type.as_str(), record_type.as_str()), &args[2], mode);
    println!("🔍 searchable-search-only\n=======================");
    println!("Type: {}  Keywords: {}  Index directory: {}", record_type, query.keywords, index_dir.display());
    if query.matches_nothing() { println!("\nNo keywords left after cleaning."); return Ok(()); }

    let engine = TantivySearchEngine::open_in_dir(&index_dir)?;
    let request = MatchRequest { record_type, keywords: &query.keywords, mode: query.mode };
    let mut hits: Vec<(u64, f64)> = engine
        .match_scores(&request)?
        .into_iter()
        .map(|m| (m.record_id, query.weights.score(f64::from(m.title_score), f64::from(m.title_content_score))))
        .collect();
    hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    println!("\nFound {} matching rows", hits.len());
    for (i, (id, score)) in hits.iter().enumerate() { println!("  {}. score={:.4}  id={}", i + 1, score, id); }
    Ok(())
}
