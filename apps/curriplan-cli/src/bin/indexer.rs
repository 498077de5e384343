use std::path::PathBuf;

use clap::Parser;
use curriplan_cli::{init_tracing, load_settings};
use curriplan_core::data_processor::DataProcessor;
use curriplan_embed::load_embedder;
use curriplan_vector::CorpusBuilder;
use tracing::info;

#[derive(Parser)]
#[command(name = "curriplan-indexer")]
#[command(about = "Build the methodology corpus index from plain-text documents")]
#[command(version)]
struct Cli {
    #[arg(help = "Directory of .txt documents (defaults to data.corpus_dir)")]
    corpus_dir: Option<PathBuf>,

    #[arg(long, help = "Index only the first N files")]
    limit: Option<usize>,

    #[arg(long, help = "Output directory (defaults to data.index_dir)")]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;

    let corpus_dir = cli.corpus_dir.unwrap_or_else(|| settings.data.corpus_dir());
    let out_dir = cli.out.unwrap_or_else(|| settings.data.index_dir());
    info!(corpus = %corpus_dir.display(), out = %out_dir.display(), "building corpus index");

    let processor = DataProcessor::with_config(settings.chunking)?;
    let embedder = load_embedder(&settings.embedding)?;
    let manifest = CorpusBuilder::new(processor, embedder.as_ref())
        .batch_size(settings.embedding.batch_size)
        .show_progress(true)
        .build(&corpus_dir, &out_dir, cli.limit)?;

    println!("\n✅ Indexed {} chunks into {}", manifest.count, out_dir.display());
    println!("   encoder: {}  dim: {}", manifest.encoder_id, manifest.dim);
    println!("\n💡 To query the index, use: cargo run --bin curriplan-search '<query>'");
    Ok(())
}
