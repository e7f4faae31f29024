use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

use price_reconciler::app::ports::RecordSink;
use price_reconciler::config::Config;
use price_reconciler::infra::output_adapter::JsonLinesSink;
use price_reconciler::observability;
use price_reconciler::{CatalogKind, Orchestrator};

#[derive(Parser)]
#[command(name = "price_reconciler")]
#[command(about = "Compare product names and prices across two catalog search pages")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to $PRICE_RECONCILER_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the number of concurrent fetches per catalog
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up identifier pairs in both catalogs and write comparison rows
    Pairs {
        /// File with one "praktis_code,praktiker_code" pair per line
        #[arg(long)]
        input: Option<PathBuf>,
        /// Inline pair as PRAKTIS:PRAKTIKER (repeatable)
        #[arg(long = "pair")]
        pairs: Vec<String>,
        /// Output NDJSON file (default: output/product_details_<timestamp>.jsonl)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Look up identifiers in a single catalog
    Catalog {
        /// Catalog to query. Available: praktis, praktiker
        #[arg(long)]
        catalog: String,
        /// Comma-separated identifiers
        #[arg(long)]
        ids: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Splits one input line into a pair. Accepts comma, semicolon, tab, or colon
/// separators; blank lines and `#` comments yield `None`.
fn parse_pair_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.splitn(2, |c: char| matches!(c, ',' | ';' | '\t' | ':'));
    let left = parts.next()?.trim().to_string();
    let right = parts.next().unwrap_or_default().trim().to_string();
    Some((left, right))
}

fn read_pairs(input: Option<&Path>, inline: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    if let Some(path) = input {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading pairs from {}", path.display()))?;
        pairs.extend(content.lines().filter_map(parse_pair_line));
    }
    pairs.extend(inline.iter().filter_map(|p| parse_pair_line(p)));
    if pairs.is_empty() {
        bail!("no identifier pairs given (use --input or --pair)");
    }
    Ok(pairs)
}

fn default_output(config: &Config) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    Path::new(&config.output.directory).join(format!("product_details_{}.jsonl", timestamp))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(concurrency) = cli.concurrency {
        config.orchestrator.concurrency = concurrency;
    }
    config.validate()?;

    observability::init_logging(&config.output.log_directory);

    let orchestrator = Orchestrator::from_config(&config)?;
    let started = Instant::now();

    match cli.command {
        Commands::Pairs { input, pairs, output } => {
            let pairs = read_pairs(input.as_deref(), &pairs)?;
            println!("🔄 Comparing {} identifier pairs...", pairs.len());

            let rows = orchestrator.run_pairs(pairs.as_slice()).await.map_err(|e| {
                error!("Paired run failed: {}", e);
                e
            })?;

            let path = output.unwrap_or_else(|| default_output(&config));
            let sink = JsonLinesSink::create(&path)?;
            sink.write_comparisons(&rows).await?;

            println!("✅ Data exported successfully to {}", sink.path().display());
        }
        Commands::Catalog { catalog, ids, output } => {
            let kind: CatalogKind = catalog.parse().map_err(anyhow::Error::msg)?;
            let ids: Vec<&str> = ids.split(',').collect();
            println!("🔄 Looking up {} identifiers in {}...", ids.len(), kind);

            let run = orchestrator.run(ids.as_slice(), kind).await?;

            let path = output.unwrap_or_else(|| default_output(&config));
            let sink = JsonLinesSink::create(&path)?;
            sink.write_products(&run.records).await?;

            println!(
                "✅ {} {} records ({} failed fetches) in {:.2}s written to {}",
                run.records.len(),
                run.catalog,
                run.failed_fetches,
                run.elapsed.as_secs_f64(),
                sink.path().display()
            );
        }
    }

    let elapsed = started.elapsed().as_secs_f64();
    info!(elapsed_secs = elapsed, "run complete");
    println!("   Execution time: {:.2} seconds", elapsed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_lines_accept_common_separators() {
        assert_eq!(parse_pair_line("123,456"), Some(("123".into(), "456".into())));
        assert_eq!(parse_pair_line(" 123 ;\t456 "), Some(("123".into(), "456".into())));
        assert_eq!(parse_pair_line("123\t456"), Some(("123".into(), "456".into())));
        assert_eq!(parse_pair_line("123:456"), Some(("123".into(), "456".into())));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert_eq!(parse_pair_line("   "), None);
        assert_eq!(parse_pair_line("# praktis,praktiker"), None);
    }

    #[test]
    fn missing_right_side_is_kept_for_the_engine_to_reject() {
        assert_eq!(parse_pair_line("123"), Some(("123".into(), String::new())));
    }

    #[test]
    fn read_pairs_merges_file_and_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        std::fs::write(&path, "# header\n1,2\n\n3,4\n").unwrap();
        let pairs = read_pairs(Some(&path), &["5:6".to_string()]).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], ("5".into(), "6".into()));
    }

    #[test]
    fn read_pairs_requires_something() {
        assert!(read_pairs(None, &[]).is_err());
    }
}
