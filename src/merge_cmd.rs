use std::io::{self, Write};

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::MergeArgs,
    evolve::{EvolveConfig, merge_files},
    io_utils,
    merge::RowSource,
};

pub fn execute(args: &MergeArgs) -> Result<()> {
    let config = EvolveConfig {
        delimiter: args.settings.delimiter,
        merge: args.settings.merge_options(),
        input_encoding: io_utils::resolve_encoding(args.settings.input_encoding.as_deref())?,
        output_encoding: io_utils::resolve_encoding(args.output_encoding.as_deref())?,
        ..EvolveConfig::default()
    };
    info!(
        "Merging template '{}' with deployed '{}' (delimiter '{}', axis {:?})",
        args.new.display(),
        args.old.display(),
        crate::printable_delimiter(config.delimiter),
        config.merge.axis
    );

    let (text, outcome) = merge_files(&args.new, &args.old, &config)?;
    match args.output.as_deref() {
        Some(path) if !io_utils::is_dash(path) => {
            io_utils::write_encoded(path, &text, config.output_encoding)?;
        }
        _ => {
            let bytes = io_utils::encode_text(&text, config.output_encoding)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes).context("Writing merged output")?;
            stdout.flush().context("Flushing stdout")?;
        }
    }

    let destination = args
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!(
        "Merged {} record(s) ({} kept, {} orphaned) -> {}",
        outcome.records().len(),
        outcome.count(|s| *s == RowSource::Reused),
        outcome.orphans().len(),
        destination
    );
    Ok(())
}
