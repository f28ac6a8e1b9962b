use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::merge::{MergeAxis, MergeOptions, OrphanPolicy};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Evolve deployed CSV configuration files to an updated template",
    long_about = None
)]
pub struct Cli {
    /// Hide warnings; per-file progress and the summary are still printed
    #[arg(short, long, global = true)]
    pub quiet: bool,
    /// Emit debugging detail for every merge step
    #[arg(short, long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evolve the files in DST_DIR using the templates in SRC_DIR, backing up DST_DIR first
    Evolve(EvolveArgs),
    /// Merge a single template/deployed pair of files
    Merge(MergeArgs),
    /// Show how each record of a single pair would be merged, without writing anything
    Preview(PreviewArgs),
}

#[derive(Debug, Clone, Args)]
pub struct MergeSettings {
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter, default_value = ",")]
    pub delimiter: u8,
    /// Whether records are matched as rows (by first field) or columns (by header name)
    #[arg(long, value_enum, default_value_t = MergeAxis::Rows)]
    pub axis: MergeAxis,
    /// What to do with deployed records that no longer appear in the template
    #[arg(long = "orphans", value_enum, default_value_t = OrphanPolicy::Drop)]
    pub orphans: OrphanPolicy,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl MergeSettings {
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            axis: self.axis,
            orphans: self.orphans,
        }
    }
}

#[derive(Debug, Args)]
pub struct EvolveArgs {
    /// Directory holding the updated template files
    pub src_dir: PathBuf,
    /// Directory holding the deployed files to evolve in place
    pub dst_dir: PathBuf,
    /// File name to evolve (repeatable); defaults to every *.csv in either directory
    #[arg(short = 'f', long = "file", action = clap::ArgAction::Append)]
    pub files: Vec<String>,
    /// YAML manifest listing the file names to evolve
    #[arg(short, long, conflicts_with = "files")]
    pub manifest: Option<PathBuf>,
    /// strftime pattern naming the backup directory created inside DST_DIR
    #[arg(long = "backup-format", default_value = crate::evolve::DEFAULT_BACKUP_FORMAT)]
    pub backup_format: String,
    /// Character encoding for written files (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    #[command(flatten)]
    pub settings: MergeSettings,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Updated template file
    #[arg(short = 'n', long = "new")]
    pub new: PathBuf,
    /// Currently deployed file
    #[arg(short = 'l', long = "old")]
    pub old: PathBuf,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    #[command(flatten)]
    pub settings: MergeSettings,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Updated template file
    #[arg(short = 'n', long = "new")]
    pub new: PathBuf,
    /// Currently deployed file
    #[arg(short = 'l', long = "old")]
    pub old: PathBuf,
    #[command(flatten)]
    pub settings: MergeSettings,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            if first == crate::io_utils::COMMENT_PREFIX {
                return Err("Delimiter cannot be the comment marker '#'".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("#").is_err());
    }

    #[test]
    fn cli_parses_evolve_with_global_flags() {
        let cli = Cli::try_parse_from([
            "csv-evolve",
            "evolve",
            "new",
            "deployed",
            "-q",
            "--file",
            "a.csv",
            "--axis",
            "columns",
        ])
        .expect("parse");
        assert!(cli.quiet);
        match cli.command {
            Commands::Evolve(args) => {
                assert_eq!(args.files, vec!["a.csv"]);
                assert_eq!(args.settings.axis, MergeAxis::Columns);
                assert_eq!(args.settings.delimiter, b',');
                assert_eq!(args.backup_format, crate::evolve::DEFAULT_BACKUP_FORMAT);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
