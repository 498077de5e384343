use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use curriplan_cli::{init_tracing, load_settings};
use curriplan_core::config::Settings;
use curriplan_plan::distill::Distiller;
use curriplan_plan::generation::GeminiClient;
use curriplan_plan::{generate_plan_file, spawn, PlanEvent};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "curriplan")]
#[command(about = "Yearly kindergarten curriculum plans grounded in a methodology corpus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate the yearly plan document for one age group")]
    Generate {
        #[arg(long, help = "Age group name as it appears in the curriculum map")]
        age_group: Option<String>,
    },

    #[command(about = "Condense raw methodology texts into the corpus directory")]
    Distill {
        #[arg(long, help = "Raw documents directory (defaults to data.raw_dir)")]
        raw_dir: Option<PathBuf>,

        #[arg(long, help = "Output directory (defaults to data.corpus_dir)")]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;

    match cli.command {
        Commands::Generate { age_group } => {
            let age_group = match age_group {
                Some(name) => name,
                None => prompt_age_group(&settings.plan.age_groups)?,
            };
            run_generation(settings, age_group)
        }
        Commands::Distill { raw_dir, out } => {
            let raw_dir = raw_dir.unwrap_or_else(|| settings.data.raw_dir());
            let out_dir = out.unwrap_or_else(|| settings.data.corpus_dir());
            let client = GeminiClient::from_settings(&settings.generation)?;
            let written = Distiller::new(&client, settings.distill.window_chars)
                .show_progress(true)
                .distill_directory(&raw_dir, &out_dir)?;
            println!("✅ Distilled {} documents into {}", written, out_dir.display());
            Ok(())
        }
    }
}

fn prompt_age_group(choices: &[String]) -> anyhow::Result<String> {
    if choices.is_empty() {
        bail!("no age groups configured; pass --age-group");
    }
    println!("Выберите возрастную группу:");
    for (i, name) in choices.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("no age group selected");
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=choices.len()).contains(&n) => return Ok(choices[n - 1].clone()),
            _ => println!("Введите число от 1 до {}", choices.len()),
        }
    }
}

fn run_generation(settings: Settings, age_group: String) -> anyhow::Result<()> {
    info!(age_group = %age_group, "starting plan generation");
    let job = spawn(move |sink| generate_plan_file(&settings, &age_group, sink))
        .context("failed to start generation worker")?;

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut outcome = None;
    while outcome.is_none() {
        match job.poll() {
            Ok(Some(event)) => outcome = handle_event(&pb, event),
            Ok(None) if job.is_finished() => break,
            Ok(None) => thread::sleep(Duration::from_millis(100)),
            Err(_) => break,
        }
    }
    for event in job.join() {
        if outcome.is_none() {
            outcome = handle_event(&pb, event);
        }
    }

    match outcome {
        Some(Ok(path)) => {
            pb.finish_with_message("готово");
            println!("\n✅ План сохранён: {}", path.display());
            Ok(())
        }
        Some(Err(message)) => {
            pb.abandon_with_message("ошибка");
            error!(error = %message, "plan generation failed");
            bail!(message)
        }
        None => {
            pb.abandon();
            bail!("generation worker stopped without a result")
        }
    }
}

/// Applies one worker event to the bar; returns the final outcome once known.
fn handle_event(pb: &ProgressBar, event: PlanEvent) -> Option<Result<PathBuf, String>> {
    match event {
        PlanEvent::Status(message) => {
            pb.set_message(message);
            None
        }
        PlanEvent::Progress(percent) => {
            pb.set_position(u64::from(percent));
            None
        }
        PlanEvent::Done(path) => Some(Ok(path)),
        PlanEvent::Error(message) => Some(Err(message)),
    }
}
