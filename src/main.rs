//! image-consolidate: gather images referenced from HTML and CSS into one directory.
//!
//! Scans source files for `<img src>` and CSS background `url(...)`
//! references, rewrites them to point into a destination directory, and
//! moves the referenced images there.

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use dialoguer::Confirm;
use image_consolidate::config::{FileGroup, GroupSpec, Options, TaskConfig};
use image_consolidate::orchestrator::{Diagnostics, GroupReport, run_group, source_files};
use image_consolidate::relocator::RelocationStatus;
use image_consolidate::rewriter::{FileStatus, rewrite_file};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Commands, TaskArgs};

#[derive(Serialize)]
struct GroupOutput<'a> {
    #[serde(flatten)]
    report: &'a GroupReport,
    diagnostics: Diagnostics,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    match args.command {
        Commands::Scan { task, json } => cmd_scan(&task, json),
        Commands::Run {
            task,
            dry_run,
            interactive,
            json,
        } => cmd_run(&task, dry_run, interactive, json),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to initialize logging: {err}"))
}

/// Builds the task from a config file or from inline group flags.
///
/// Inline `--format` and `--new-relative-uri` override the file's options.
fn load_task(task: &TaskArgs) -> Result<TaskConfig> {
    let mut config = match &task.config {
        Some(path) => TaskConfig::load(path)
            .with_context(|| format!("Failed to load task file {}", path.display()))?,
        None => {
            let Some(dest) = task.dest.clone() else {
                bail!("either --config or --dest is required");
            };
            if task.src.is_empty() {
                bail!("at least one --src is required");
            }
            TaskConfig {
                options: Options::default(),
                groups: vec![GroupSpec {
                    cwd: task.cwd.clone(),
                    src: task.src.clone(),
                    dest,
                }],
            }
        }
    };

    if !task.formats.is_empty() {
        config.options.valid_formats = task.formats.clone();
    }
    if let Some(uri) = &task.new_relative_uri {
        config.options.new_relative_uri = Some(uri.clone());
    }
    Ok(config)
}

fn expand_groups(config: &TaskConfig) -> Result<Vec<FileGroup>> {
    config
        .groups
        .iter()
        .map(|spec| {
            spec.expand()
                .with_context(|| format!("Failed to expand sources for {}", spec.dest.display()))
        })
        .collect()
}

fn cmd_scan(task: &TaskArgs, json_output: bool) -> Result<()> {
    let config = load_task(task)?;
    let groups = expand_groups(&config)?;
    let options = &config.options;

    let mut all = Vec::new();
    for group in &groups {
        let target_uri = options
            .new_relative_uri
            .clone()
            .unwrap_or_else(|| group.dest.to_string_lossy().into_owned());
        for file in source_files(group) {
            all.push(rewrite_file(&file, &options.valid_formats, &target_uri, true));
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    println!("Would scan {} files:", all.len());
    for status in &all {
        print_file_status(status);
    }
    Ok(())
}

fn cmd_run(task: &TaskArgs, dry_run: bool, interactive: bool, json_output: bool) -> Result<()> {
    let mut config = load_task(task)?;
    config.options.dry_run |= dry_run;
    let groups = expand_groups(&config)?;

    if interactive {
        let preview = Options {
            dry_run: true,
            ..config.options.clone()
        };
        for group in &groups {
            print_group_report(&run_group(group, &preview));
        }
        let proceed = Confirm::new()
            .with_prompt("Apply these changes?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !proceed {
            println!("{} No changes applied", "info:".blue().bold());
            return Ok(());
        }
    }

    let reports: Vec<GroupReport> = groups
        .iter()
        .map(|group| run_group(group, &config.options))
        .collect();

    if json_output {
        let output: Vec<GroupOutput> = reports
            .iter()
            .map(|report| GroupOutput {
                report,
                diagnostics: report.diagnostics(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for report in &reports {
            print_group_report(report);
        }
        if config.options.dry_run {
            println!("\n{} Run without --dry-run to apply changes", "hint:".cyan().bold());
        }
    }

    Ok(())
}

fn print_file_status(status: &FileStatus) {
    match status {
        FileStatus::Rewritten { scan, .. } => {
            println!(
                "{} [{} matches] {}",
                "ok:".green().bold(),
                scan.accepted.len(),
                scan.file.display()
            );
            for (sub, image) in scan.substitutions.iter().zip(&scan.images) {
                println!(
                    "    {} {} {}",
                    sub.from.red(),
                    "->".green(),
                    sub.to.green()
                );
                println!("      {}", image.display().to_string().dimmed());
            }
            if !scan.rejected.is_empty() {
                println!(
                    "    {} ignored image extensions: {}",
                    "note:".cyan(),
                    scan.rejected.join(", ")
                );
            }
        }
        FileStatus::Skipped { reason, .. } => {
            println!("{} {}", "warn:".yellow().bold(), reason);
        }
        FileStatus::Failed { file, reason } => {
            println!(
                "{} {} {}",
                "error:".red().bold(),
                file.display(),
                format!("({reason})").dimmed()
            );
        }
    }
}

fn print_group_report(report: &GroupReport) {
    println!(
        "\n{} {} -> {}",
        if report.dry_run { "Would normalize:" } else { "Normalizing:" }
            .yellow()
            .bold(),
        report.destination.display(),
        report.target_uri
    );

    for status in &report.files {
        print_file_status(status);
    }

    if let Some(err) = &report.destination_error {
        println!("{} {}", "error:".red().bold(), err);
    }

    if !report.relocations.is_empty() {
        println!("Moving images into {}:", report.destination.display());
    }
    for relocation in &report.relocations {
        let source = relocation.source.display();
        let target = relocation.target.display();
        match &relocation.status {
            RelocationStatus::Moved {
                removed_dir,
                cleanup_error,
            } => {
                println!("    {} {} -> {}", "moved".green(), source, target);
                if let Some(dir) = removed_dir {
                    println!("      {} {}", "removed empty".dimmed(), dir.display());
                }
                if let Some(err) = cleanup_error {
                    println!("      {} {}", "warn:".yellow(), err);
                }
            }
            RelocationStatus::WouldMove => {
                println!("    {} {} -> {}", "would move".yellow(), source, target);
            }
            RelocationStatus::AlreadyInPlace => {
                println!("    {} {}", "in place".dimmed(), source);
            }
            RelocationStatus::NotFound => {
                println!("    {} {}", "[failed - not found]".red(), source);
            }
            RelocationStatus::Failed { reason } => {
                println!("    {} {} {}", "[failed]".red(), source, format!("({reason})").dimmed());
            }
        }
    }

    print_summary(&report.diagnostics());
}

fn print_summary(d: &Diagnostics) {
    println!("{}", "-------- Completed --------".bold());
    println!("* {} source files scanned", d.files_scanned);
    println!("* {} images found", d.images_found);
    if d.files_failed + d.images_missing + d.relocation_failures > 0 {
        println!(
            "* {} file failures, {} images missing, {} moves failed",
            d.files_failed, d.images_missing, d.relocation_failures
        );
    }
}
