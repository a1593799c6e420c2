pub mod workers;

use std::path::PathBuf;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};
use revmix_core::reverb::{DEFAULT_TOOL, REFERENCE_WORKERS};

use crate::cli::workers::parse_workers;

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Generate reverberated soundscape mixtures and their manifests")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(reverberate_command())
        .subcommand(durations_command())
        .subcommand(sources_command())
}

fn reverberate_command() -> Command {
    Command::new("reverberate")
        .about("Run the external reverberation tool over a folder of source audio")
        .arg(
            Arg::new("audio-dir")
                .long("audio-dir")
                .value_name("DIR")
                .help("Folder containing the dry source audio")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("rir-dir")
                .long("rir-dir")
                .value_name("DIR")
                .help("Folder containing the room impulse responses")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("subset")
                .long("subset")
                .value_name("SUBSET")
                .help("Impulse response subset to apply")
                .default_value("train")
                .value_parser(["train", "validation", "eval"]),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory where the reverberated mixtures will be written")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("mix-info")
                .long("mix-info")
                .value_name("FILE")
                .help("Mix-info manifest path (default: mix_info.tsv in the output directory)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("source-list")
                .long("source-list")
                .value_name("FILE")
                .help("Source-list manifest path (default: src_list.tsv in the output directory)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("rir-list")
                .long("rir-list")
                .value_name("FILE")
                .help("RIR-list manifest path (default: rir_list.tsv in the output directory)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("COUNT")
                .help(format!(
                    "Worker processes requested from the tool: a number or 'auto' \
                     (default: {REFERENCE_WORKERS}, the reference value)"
                ))
                .value_parser(ValueParser::new(parse_workers)),
        )
        .arg(
            Arg::new("tool")
                .long("tool")
                .value_name("PROGRAM")
                .help("External reverberation program to invoke")
                .default_value(DEFAULT_TOOL)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the tool invocation without running it")
                .action(ArgAction::SetTrue),
        )
}

fn durations_command() -> Command {
    Command::new("durations")
        .about("Probe wav durations and emit a filename/duration manifest")
        .arg(
            Arg::new("audio_dir")
                .value_name("AUDIO_DIR")
                .help("Folder whose wav files are probed")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("TSV")
                .help("Write the manifest to this file instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn sources_command() -> Command {
    Command::new("sources")
        .about("List the isolated-event wav files below a folder of mixtures")
        .arg(
            Arg::new("wav_dir")
                .value_name("WAV_DIR")
                .help("Folder whose subdirectories hold the separated sources")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("TSV")
                .help("Write the manifest to this file instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
}
