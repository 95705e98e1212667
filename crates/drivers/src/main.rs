mod config;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use config::AppConfig;
use dvtag_adapters::{
    present_scan_banner, ContainerTagStore, FsCreationTimeStore, MediaInfoCliProber,
    WalkdirFileScanner,
};
use dvtag_application::{ApplicationError, CaptureTagService, FileReport, TagFolderCommand};
use dvtag_domain::ZoneTable;
use output::{render_file, render_summary, OutputOptions};
use thiserror::Error;
use tracing::info;

/// Tags DV captures with tape name and timecodes from their capture metadata
/// and sets their creation time to the recorded date.
#[derive(Parser, Debug)]
#[command(name = "dvtag", version, about, long_about = None)]
struct Args {
    /// Folder containing the captured files
    #[arg(short = 'f', long = "folder-path")]
    folder_path: PathBuf,

    /// File name pattern to match
    #[arg(short = 'p', long)]
    pattern: Option<String>,

    /// Write tag and creation time changes; otherwise only report them
    #[arg(short = 'u', long)]
    perform_update: bool,

    /// Descend into child folders
    #[arg(short = 'r', long = "recurse")]
    recurse: bool,

    /// Show the capture metadata of each file
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only show blocked overrides, errors and the summary
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Replace tag values that are already set
    #[arg(short = 'o', long)]
    allow_tag_overrides: bool,

    /// Path to the mediainfo executable
    #[arg(long, env = "DVTAG_MEDIAINFO")]
    mediainfo: Option<PathBuf>,

    /// Emit one JSON object per file and one for the summary
    #[arg(long)]
    json: bool,

    /// Log filter for diagnostics on stderr, e.g. `debug` or `dvtag_application=info`
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

#[derive(Debug, Error)]
enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Runtime(String),
}

impl From<ApplicationError> for CommandError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::InvalidInput(msg) => Self::Usage(msg),
            other => Self::Runtime(format!("tagging failed: {other}")),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = AppConfig::default().with_overrides(
        args.mediainfo.clone(),
        args.pattern.clone(),
        args.log_level.clone(),
    );
    logging::init_logging(&config.log_filter);

    let service = build_application_service(&config);
    match run_command(&args, &config, &service) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Usage(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(2)
        }
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

fn build_application_service(config: &AppConfig) -> CaptureTagService {
    CaptureTagService::new(
        Box::new(WalkdirFileScanner),
        Box::new(MediaInfoCliProber::new(config.mediainfo_path.clone())),
        Box::new(ContainerTagStore::default()),
        Box::new(FsCreationTimeStore),
        ZoneTable::capture_regions(),
    )
}

fn output_options(args: &Args) -> OutputOptions {
    OutputOptions {
        quiet: args.quiet,
        verbose: args.verbose,
        json: args.json,
        apply: args.perform_update,
    }
}

fn tag_folder_command(args: &Args, config: &AppConfig) -> TagFolderCommand {
    TagFolderCommand {
        folder: args.folder_path.clone(),
        pattern: config.pattern.clone(),
        recursive: args.recurse,
        apply: args.perform_update,
        allow_override: args.allow_tag_overrides,
    }
}

fn run_command(
    args: &Args,
    config: &AppConfig,
    service: &CaptureTagService,
) -> Result<(), CommandError> {
    let options = output_options(args);
    let command = tag_folder_command(args, config);

    if !options.json {
        println!(
            "{}",
            present_scan_banner(&command.folder, &command.pattern, command.recursive)
        );
    }
    info!(
        folder = %command.folder.display(),
        pattern = %command.pattern,
        apply = command.apply,
        allow_override = command.allow_override,
        "tagging started"
    );

    let statistics = service.tag_folder(command, &mut |report: &FileReport| {
        let rendered = render_file(report, &options);
        for line in rendered.stdout {
            println!("{line}");
        }
        for line in rendered.stderr {
            eprintln!("{line}");
        }
    })?;

    for line in render_summary(&statistics, &options) {
        println!("{line}");
    }
    Ok(())
}
