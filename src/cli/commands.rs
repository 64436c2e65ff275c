//! Command implementations for the quarry CLI.

use std::time::Instant;

use tracing::info;

use crate::cli::args::{Command, QuarryArgs, SearchArgs, StatsArgs};
use crate::cli::definition::IndexDefinition;
use crate::cli::output::{Hit, SearchResults, StatsResult, output_search_results, output_stats};
use crate::config::SearchOptions;
use crate::error::Result;
use crate::index::IndexSpec;

/// Execute a CLI command.
pub fn execute_command(args: &QuarryArgs) -> Result<()> {
    match &args.command {
        Command::Search(search_args) => {
            let results = search(search_args)?;
            output_search_results(&results, args)
        }
        Command::Stats(stats_args) => {
            let result = stats(stats_args)?;
            output_stats(&result, args)
        }
    }
}

/// Load the index and run the query, keeping the best `limit` hits.
pub fn search(args: &SearchArgs) -> Result<SearchResults> {
    let index = IndexDefinition::load(&args.index_file)?.build()?;
    let options = SearchOptions::new()
        .with_language(&args.language)
        .with_verbatim(args.verbatim)
        .with_scorer(&args.scorer);

    let start = Instant::now();
    let hits = run_query(&index, &args.query, &options)?;
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(query = %args.query, hits = hits.len(), duration_ms, "executed query");

    let total_hits = hits.len();
    Ok(SearchResults {
        query: args.query.clone(),
        scorer: options.scorer.clone(),
        hits: hits.into_iter().take(args.limit).collect(),
        total_hits,
        duration_ms,
    })
}

/// All hits of `query`, best score first.
pub fn run_query(index: &IndexSpec, query: &str, options: &SearchOptions) -> Result<Vec<Hit>> {
    let mut results = index.iterate_query_with(query, options)?;
    let mut hits = Vec::new();
    while let Some(key) = results.advance()? {
        let key = String::from_utf8_lossy(key).into_owned();
        let score = results.score();
        hits.push(Hit { key, score });
    }
    results.release();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
    Ok(hits)
}

fn stats(args: &StatsArgs) -> Result<StatsResult> {
    let index = IndexDefinition::load(&args.index_file)?.build()?;
    Ok(StatsResult {
        name: index.name().to_string(),
        fields: index.schema().len(),
        stats: index.stats(),
    })
}
