//! Batch evolution of a deployed directory against a template directory.
//!
//! Each listed file is handled on its own: the deployed copy is first moved
//! into a timestamped backup directory, then the destination is rebuilt from
//! whichever of the template and the backup exist. A file that fails to merge
//! is logged and its deployed copy is put back unchanged; the remaining files
//! still proceed.
//!
//! Quiet mode hides warnings and the run banner but keeps the per-file
//! `copied:`/`evolved:` lines and the closing summary.

use std::{
    fmt::{self, Write as _},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, ensure};
use chrono::Local;
use encoding_rs::{Encoding, UTF_8};
use itertools::Itertools;
use log::{LevelFilter, debug, error, info, warn};

use crate::{
    cli::EvolveArgs,
    io_utils,
    manifest,
    merge::{MergeOptions, MergeOutcome, RowSource, merge},
    row::{Row, parse_rows, render_rows},
    transpose::transpose,
};

pub const DEFAULT_BACKUP_FORMAT: &str = "%Y%m%d%H%M%S_bk";

/// Everything a run needs, passed explicitly rather than held in globals.
#[derive(Debug, Clone)]
pub struct EvolveConfig {
    pub quiet: bool,
    pub debug: bool,
    pub files: Vec<String>,
    pub delimiter: u8,
    pub merge: MergeOptions,
    pub input_encoding: &'static Encoding,
    pub output_encoding: &'static Encoding,
    pub backup_format: String,
}

impl Default for EvolveConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            debug: false,
            files: Vec::new(),
            delimiter: io_utils::DEFAULT_DELIMITER,
            merge: MergeOptions::default(),
            input_encoding: UTF_8,
            output_encoding: UTF_8,
            backup_format: DEFAULT_BACKUP_FORMAT.to_string(),
        }
    }
}

impl EvolveConfig {
    pub fn log_level(&self) -> LevelFilter {
        log_level(self.debug)
    }
}

pub(crate) fn log_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// `warn!` unless the run is quiet.
macro_rules! notice {
    ($config:expr, $($arg:tt)+) => {
        if !$config.quiet {
            warn!($($arg)+);
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Evolved { reused: usize, synthesized: usize },
    Copied,
    Restored,
    Skipped,
    Failed(String),
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Evolved {
                reused,
                synthesized,
            } => write!(f, "evolved ({reused} kept, {synthesized} from template)"),
            FileOutcome::Copied => f.write_str("copied from template"),
            FileOutcome::Restored => f.write_str("restored from backup"),
            FileOutcome::Skipped => f.write_str("skipped"),
            FileOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolveReport {
    pub backup_dir: PathBuf,
    pub entries: Vec<(String, FileOutcome)>,
}

impl EvolveReport {
    pub fn outcome(&self, name: &str) -> Option<&FileOutcome> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Failed(_)))
    }

    fn count(&self, wanted: fn(&FileOutcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| wanted(outcome))
            .count()
    }

    pub fn summary(&self) -> String {
        format!(
            "evolved {}, copied {}, restored {}, skipped {}, failed {}",
            self.count(|o| matches!(o, FileOutcome::Evolved { .. })),
            self.count(|o| matches!(o, FileOutcome::Copied)),
            self.count(|o| matches!(o, FileOutcome::Restored)),
            self.count(|o| matches!(o, FileOutcome::Skipped)),
            self.failures()
        )
    }
}

pub fn execute(args: &EvolveArgs, quiet: bool, debug: bool) -> Result<()> {
    let files = manifest::resolve_files(
        &args.files,
        args.manifest.as_deref(),
        &args.src_dir,
        &args.dst_dir,
    )?;
    let config = EvolveConfig {
        quiet,
        debug,
        files,
        delimiter: args.settings.delimiter,
        merge: args.settings.merge_options(),
        input_encoding: io_utils::resolve_encoding(args.settings.input_encoding.as_deref())?,
        output_encoding: io_utils::resolve_encoding(args.output_encoding.as_deref())?,
        backup_format: args.backup_format.clone(),
    };
    if !config.quiet {
        info!("Src dir: {:?}", args.src_dir);
        info!("Dst dir: {:?}", args.dst_dir);
    }
    let report = evolve_directory(&args.src_dir, &args.dst_dir, &config)?;
    info!("Done: {}", report.summary());
    Ok(())
}

pub fn evolve_directory(
    src_dir: &Path,
    dst_dir: &Path,
    config: &EvolveConfig,
) -> Result<EvolveReport> {
    ensure!(src_dir.is_dir(), "Source directory {src_dir:?} does not exist");
    ensure!(dst_dir.is_dir(), "Destination directory {dst_dir:?} does not exist");

    let backup_dir = dst_dir.join(backup_name(&config.backup_format)?);
    fs::create_dir(&backup_dir)
        .with_context(|| format!("Creating backup directory {backup_dir:?}"))?;
    if !config.quiet {
        info!("Backup dir: {backup_dir:?}");
    }

    for name in &config.files {
        let deployed = dst_dir.join(name);
        if deployed.exists() {
            fs::rename(&deployed, backup_dir.join(name))
                .with_context(|| format!("Moving {deployed:?} into {backup_dir:?}"))?;
            debug!("{deployed:?} moved to backup");
        } else {
            notice!(config, "File does not exist - {deployed:?}");
        }
    }

    let mut entries = Vec::with_capacity(config.files.len());
    for name in &config.files {
        let outcome = match evolve_file(name, src_dir, dst_dir, &backup_dir, config) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Failed to evolve {name}: {err:#}");
                put_back_deployed(name, dst_dir, &backup_dir);
                FileOutcome::Failed(format!("{err:#}"))
            }
        };
        entries.push((name.clone(), outcome));
    }

    Ok(EvolveReport {
        backup_dir,
        entries,
    })
}

/// Restores the deployed copy of a file whose evolution failed.
fn put_back_deployed(name: &str, dst_dir: &Path, backup_dir: &Path) {
    let saved = backup_dir.join(name);
    if !saved.exists() {
        return;
    }
    let out_path = dst_dir.join(name);
    match fs::copy(&saved, &out_path) {
        Ok(_) => info!("restored after failure: {out_path:?}"),
        Err(err) => error!("Could not restore {saved:?} to {out_path:?}: {err}"),
    }
}

fn backup_name(format: &str) -> Result<String> {
    let mut name = String::new();
    write!(name, "{}", Local::now().format(format))
        .map_err(|_| anyhow!("Invalid backup directory format '{format}'"))?;
    manifest::validate_file_name(&name)
        .with_context(|| format!("Backup directory format '{format}'"))?;
    Ok(name)
}

fn evolve_file(
    name: &str,
    src_dir: &Path,
    dst_dir: &Path,
    backup_dir: &Path,
    config: &EvolveConfig,
) -> Result<FileOutcome> {
    let old_path = backup_dir.join(name);
    let new_path = src_dir.join(name);
    let out_path = dst_dir.join(name);
    debug!("old: {old_path:?}, new: {new_path:?}, out: {out_path:?}");

    match (old_path.exists(), new_path.exists()) {
        (false, false) => {
            notice!(config, "Neither {old_path:?} nor {new_path:?} exists");
            Ok(FileOutcome::Skipped)
        }
        (false, true) => {
            notice!(config, "No deployed copy of {name}; using template as-is");
            fs::copy(&new_path, &out_path)
                .with_context(|| format!("Copying {new_path:?} to {out_path:?}"))?;
            info!("copied: {new_path:?}");
            Ok(FileOutcome::Copied)
        }
        (true, false) => {
            notice!(config, "No template for {name}; keeping deployed copy");
            fs::copy(&old_path, &out_path)
                .with_context(|| format!("Copying {old_path:?} to {out_path:?}"))?;
            info!("copied: {old_path:?}");
            Ok(FileOutcome::Restored)
        }
        (true, true) => {
            let (text, outcome) = merge_files(&new_path, &old_path, config)?;
            io_utils::write_encoded(&out_path, &text, config.output_encoding)?;
            info!("evolved: {out_path:?}");
            Ok(FileOutcome::Evolved {
                reused: outcome.count(|s| *s == RowSource::Reused),
                synthesized: outcome.count(|s| *s != RowSource::Reused),
            })
        }
    }
}

/// Reads both files and renders the merged output, template comments first.
pub fn merge_files(
    new_path: &Path,
    old_path: &Path,
    config: &EvolveConfig,
) -> Result<(String, MergeOutcome)> {
    let new = io_utils::read_sections(new_path, config.input_encoding)?;
    let old = io_utils::read_sections(old_path, config.input_encoding)?;
    debug!("{} comment line(s) in {new_path:?}", new.comments.len());

    let outcome = plan_merge(&new.data, &old.data, config.delimiter, &config.merge)
        .with_context(|| format!("Merging {new_path:?} with {old_path:?}"))?;
    if !outcome.orphans().is_empty() {
        notice!(
            config,
            "Dropping {} deployed record(s) of {old_path:?} with no counterpart in the template: {}",
            outcome.orphans().len(),
            outcome.orphans().iter().map(Row::key).join(", ")
        );
    }
    let rows = outcome.rows()?;
    let text = io_utils::render_lines(&new.comments, &rows, config.delimiter)?;
    Ok((text, outcome))
}

/// Parses and transposes both data sections, then merges them.
pub fn plan_merge<S: AsRef<str>>(
    new_lines: &[S],
    old_lines: &[S],
    delimiter: u8,
    options: &MergeOptions,
) -> Result<MergeOutcome> {
    let new_cols = columns_of(new_lines, delimiter).context("Reading new table")?;
    let old_cols = columns_of(old_lines, delimiter).context("Reading old table")?;
    Ok(merge(&new_cols, &old_cols, options)?)
}

/// Merges two sets of data lines and returns the merged data lines.
pub fn evolve_lines<S: AsRef<str>>(
    new_lines: &[S],
    old_lines: &[S],
    delimiter: u8,
    options: &MergeOptions,
) -> Result<Vec<String>> {
    let outcome = plan_merge(new_lines, old_lines, delimiter, options)?;
    Ok(render_rows(&outcome.rows()?, delimiter))
}

fn columns_of<S: AsRef<str>>(lines: &[S], delimiter: u8) -> Result<Vec<Row>> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    Ok(transpose(&parse_rows(lines, delimiter))?)
}
