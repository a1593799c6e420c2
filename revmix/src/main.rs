mod cli;

use std::path::PathBuf;

use anyhow::Context;
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use revmix_core::manifest;
use revmix_core::reverb::{self, ReverbConfig, RirSubset};
use revmix_core::scan::{self, ScanProgress};

use crate::cli::build_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();
    match matches.subcommand() {
        Some(("reverberate", sub)) => run_reverberate(sub),
        Some(("durations", sub)) => run_durations(sub),
        Some(("sources", sub)) => run_sources(sub),
        _ => unreachable!("a subcommand is required"),
    }
}

fn run_reverberate(matches: &ArgMatches) -> anyhow::Result<()> {
    let audio_dir = matches
        .get_one::<PathBuf>("audio-dir")
        .expect("required argument");
    let rir_dir = matches
        .get_one::<PathBuf>("rir-dir")
        .expect("required argument");
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .expect("required argument");
    let subset: RirSubset = matches
        .get_one::<String>("subset")
        .expect("defaulted argument")
        .parse()?;
    let program = matches
        .get_one::<PathBuf>("tool")
        .expect("defaulted argument");

    let mut builder = ReverbConfig::builder(audio_dir, rir_dir, output_dir)
        .subset(subset)
        .program(program);
    if let Some(workers) = matches.get_one::<usize>("workers") {
        builder = builder.workers(*workers);
    }
    if let Some(path) = matches.get_one::<PathBuf>("mix-info") {
        builder = builder.mix_info(path);
    }
    if let Some(path) = matches.get_one::<PathBuf>("source-list") {
        builder = builder.source_list(path);
    }
    if let Some(path) = matches.get_one::<PathBuf>("rir-list") {
        builder = builder.rir_list(path);
    }

    let config = builder.build().with_context(|| {
        format!(
            "failed to create configuration for '{}'",
            audio_dir.display()
        )
    })?;

    if matches.get_flag("dry-run") {
        println!("Dry run: {}", config.render());
        return Ok(());
    }

    reverb::run(&config)
        .with_context(|| format!("failed to reverberate '{}'", audio_dir.display()))?;

    Ok(())
}

fn run_durations(matches: &ArgMatches) -> anyhow::Result<()> {
    let audio_dir = matches
        .get_one::<PathBuf>("audio_dir")
        .expect("required argument");
    let output = matches.get_one::<PathBuf>("output");

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);

    let progress_handle = progress.clone();
    let entries = scan::scan_durations_with_progress(audio_dir, move |event| match event {
        ScanProgress::Start { total } => {
            progress_handle.set_length(total as u64);
            progress_handle.set_message("probing");
        }
        ScanProgress::Advance { completed } => {
            progress_handle.set_position(completed as u64);
        }
        ScanProgress::Finish => {
            progress_handle.set_message("done");
        }
    })
    .with_context(|| format!("failed to probe durations in '{}'", audio_dir.display()))?;
    progress.finish_and_clear();

    match output {
        Some(path) => {
            manifest::write_durations_tsv(path, &entries)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            println!("Wrote {} duration(s) to {}", entries.len(), path.display());
        }
        None => {
            println!("{}", manifest::DURATIONS_HEADER);
            for entry in &entries {
                println!("{}\t{:.1}", entry.filename, entry.duration);
            }
        }
    }

    Ok(())
}

fn run_sources(matches: &ArgMatches) -> anyhow::Result<()> {
    let wav_dir = matches
        .get_one::<PathBuf>("wav_dir")
        .expect("required argument");
    let output = matches.get_one::<PathBuf>("output");

    let files = scan::list_isolated_wavs(wav_dir)
        .with_context(|| format!("failed to list sources in '{}'", wav_dir.display()))?;

    match output {
        Some(path) => {
            manifest::write_source_list_tsv(path, &files)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            println!("Wrote {} source(s) to {}", files.len(), path.display());
        }
        None => {
            println!("{}", manifest::SOURCE_LIST_HEADER);
            for file in &files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}
