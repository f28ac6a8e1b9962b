use anyhow::Result;
use itertools::Itertools;
use log::info;

use crate::{
    cli::PreviewArgs,
    evolve::plan_merge,
    io_utils,
    merge::{MergeAxis, MergeOutcome},
    row::Row,
    table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.settings.input_encoding.as_deref())?;
    let new = io_utils::read_sections(&args.new, encoding)?;
    let old = io_utils::read_sections(&args.old, encoding)?;
    let outcome = plan_merge(
        &new.data,
        &old.data,
        args.settings.delimiter,
        &args.settings.merge_options(),
    )?;

    let (header, rows) = plan_rows(&outcome, args.settings.delimiter);
    table::print_table(&header, &rows);
    info!(
        "Previewed {} record(s) from {:?}; {} deployed record(s) would be dropped",
        rows.len(),
        args.new,
        outcome.orphans().len()
    );
    Ok(())
}

/// One table line per merged record: position, key, provenance and fields.
pub fn plan_rows(outcome: &MergeOutcome, delimiter: u8) -> (Row, Vec<Row>) {
    let key_label = match outcome.axis() {
        MergeAxis::Rows => "key",
        MergeAxis::Columns => "column",
    };
    let header = Row::new(["#", key_label, "source", "fields"]);
    let separator = (delimiter as char).to_string();
    let rows = outcome
        .plan()
        .enumerate()
        .map(|(idx, (record, source))| {
            Row::new([
                (idx + 1).to_string(),
                record.key().to_string(),
                source.to_string(),
                record.iter().skip(1).join(&separator),
            ])
        })
        .collect();
    (header, rows)
}
