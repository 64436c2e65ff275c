//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{OutputFormat, QuarryArgs};
use crate::error::Result;
use crate::index::IndexStats;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub key: String,
    pub score: f64,
}

/// Result structure for search operations.
#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub scorer: String,
    pub hits: Vec<Hit>,
    pub total_hits: usize,
    pub duration_ms: u64,
}

/// Result structure for the stats command.
#[derive(Debug, Serialize)]
pub struct StatsResult {
    pub name: String,
    pub fields: usize,
    #[serde(flatten)]
    pub stats: IndexStats,
}

/// Print search results.
pub fn output_search_results(results: &SearchResults, args: &QuarryArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(results, args),
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!(
                    "{} hits for '{}' ({} ms, {})",
                    results.total_hits, results.query, results.duration_ms, results.scorer
                );
            }
            for (rank, hit) in results.hits.iter().enumerate() {
                println!("{:>4}. {:<24} {:.4}", rank + 1, hit.key, hit.score);
            }
            Ok(())
        }
    }
}

/// Print index statistics.
pub fn output_stats(result: &StatsResult, args: &QuarryArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Human => {
            println!("Index: {}", result.name);
            println!("  fields:      {}", result.fields);
            println!("  documents:   {}", result.stats.num_documents);
            println!("  terms:       {}", result.stats.num_terms);
            println!("  records:     {}", result.stats.num_records);
            println!("  avg doc len: {:.2}", result.stats.avg_doc_len());
            Ok(())
        }
    }
}

fn output_json<T: Serialize>(value: &T, args: &QuarryArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
