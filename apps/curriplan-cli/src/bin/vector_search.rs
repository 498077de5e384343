use std::path::PathBuf;

use clap::Parser;
use curriplan_cli::{init_tracing, load_settings};
use curriplan_core::traits::ChunkRetriever;
use curriplan_embed::load_embedder;
use curriplan_vector::Retriever;

#[derive(Parser)]
#[command(name = "curriplan-search")]
#[command(about = "Nearest-chunk lookup against the built corpus index")]
#[command(version)]
struct Cli {
    #[arg(help = "Search query")]
    query: String,

    #[arg(short, long, default_value = "5", help = "Number of chunks to return")]
    k: usize,

    #[arg(long, help = "Index directory (defaults to data.index_dir)")]
    index: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;

    let index_dir = cli.index.unwrap_or_else(|| settings.data.index_dir());
    let retriever = Retriever::open(&index_dir, load_embedder(&settings.embedding)?)?;
    let hits = retriever.search(&cli.query, cli.k)?;

    println!("🔍 Found {} results for: \"{}\"", hits.len(), cli.query);
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "\n  {}. distance={:.4}  id={}  source={}",
            i + 1,
            hit.distance,
            hit.chunk.id,
            hit.chunk.source
        );
        println!("     📝 {}", hit.chunk.content.trim());
    }
    Ok(())
}
