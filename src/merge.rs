//! Key-aligned reconciliation of an old (deployed) table with a new template.
//!
//! Both inputs arrive column-major, as produced by [`crate::transpose`]. The
//! reconciliation walks the new records in order with a forward-only cursor
//! into the old records:
//!
//! - a new record whose key matches the old record under the cursor is
//!   replaced by that old record, verbatim, and the cursor advances;
//! - any other new record is synthesized from the template and fitted to the
//!   old width: trailing fields are dropped when the new schema is wider,
//!   and the last field is repeated when it is narrower.
//!
//! Old records the cursor never reaches are orphans; [`OrphanPolicy`] decides
//! whether they are dropped with a warning or fail the merge.
//!
//! [`MergeAxis::Rows`] walks data rows keyed by their first field.
//! [`MergeAxis::Columns`] runs the same walk over the columns themselves,
//! keyed by header name, which keeps the new column layout while carrying
//! the old data rows forward.

use std::{cmp::Ordering, fmt};

use clap::ValueEnum;
use itertools::Itertools;
use log::debug;

use crate::{
    error::{EvolveError, Result},
    row::Row,
    transpose::{row_count_of, transpose},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum MergeAxis {
    /// Match data rows by their first field
    #[default]
    Rows,
    /// Match columns by header name
    Columns,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Log and discard old records that never matched
    #[default]
    Drop,
    /// Fail the merge when any old record is left unmatched
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub axis: MergeAxis,
    pub orphans: OrphanPolicy,
}

/// How a merged record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    Reused,
    Template,
    Truncated { dropped: usize },
    Padded { added: usize },
}

impl fmt::Display for RowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSource::Reused => f.write_str("old"),
            RowSource::Template => f.write_str("new"),
            RowSource::Truncated { dropped } => write!(f, "new (dropped {dropped})"),
            RowSource::Padded { added } => write!(f, "new (padded {added})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    axis: MergeAxis,
    records: Vec<Row>,
    sources: Vec<RowSource>,
    orphans: Vec<Row>,
}

impl MergeOutcome {
    pub fn axis(&self) -> MergeAxis {
        self.axis
    }

    /// Merged records along the merge axis: rows for [`MergeAxis::Rows`],
    /// columns for [`MergeAxis::Columns`].
    pub fn records(&self) -> &[Row] {
        &self.records
    }

    pub fn sources(&self) -> &[RowSource] {
        &self.sources
    }

    pub fn orphans(&self) -> &[Row] {
        &self.orphans
    }

    pub fn plan(&self) -> impl Iterator<Item = (&Row, RowSource)> {
        self.records.iter().zip(self.sources.iter().copied())
    }

    pub fn count(&self, wanted: fn(&RowSource) -> bool) -> usize {
        self.sources.iter().filter(|source| wanted(source)).count()
    }

    /// Row-major view of the merged table.
    pub fn rows(&self) -> Result<Vec<Row>> {
        match self.axis {
            MergeAxis::Rows => Ok(self.records.clone()),
            MergeAxis::Columns => transpose(&self.records),
        }
    }

    /// Column-major view of the merged table.
    pub fn columns(&self) -> Result<Vec<Row>> {
        match self.axis {
            MergeAxis::Rows => transpose(&self.records),
            MergeAxis::Columns => Ok(self.records.clone()),
        }
    }
}

/// Merges two column-major tables.
///
/// Fails with [`EvolveError::RowCount`] when the new table holds fewer
/// records than the old one along the merge axis, or when either is empty.
pub fn merge(
    new_cols: &[Row],
    old_cols: &[Row],
    options: &MergeOptions,
) -> Result<MergeOutcome> {
    match options.axis {
        MergeAxis::Rows => {
            ensure_record_counts(row_count_of(new_cols), row_count_of(old_cols))?;
            let new_rows = transpose(new_cols)?;
            let old_rows = transpose(old_cols)?;
            reconcile(&new_rows, &old_rows, options)
        }
        MergeAxis::Columns => {
            ensure_record_counts(new_cols.len(), old_cols.len())?;
            reconcile(new_cols, old_cols, options)
        }
    }
}

fn ensure_record_counts(new: usize, old: usize) -> Result<()> {
    if new < old || new == 0 || old == 0 {
        return Err(EvolveError::RowCount { new, old });
    }
    Ok(())
}

fn reconcile(new: &[Row], old: &[Row], options: &MergeOptions) -> Result<MergeOutcome> {
    let (Some(width_new), Some(width_old)) =
        (new.first().map(Row::width), old.first().map(Row::width))
    else {
        return Err(EvolveError::RowCount {
            new: new.len(),
            old: old.len(),
        });
    };
    debug!(
        "Reconciling {} new record(s) against {} old record(s); widths {} -> {}",
        new.len(),
        old.len(),
        width_new,
        width_old
    );

    let mut records = Vec::with_capacity(new.len());
    let mut sources = Vec::with_capacity(new.len());
    let mut idx_old = 0usize;

    for (idx, candidate) in new.iter().enumerate() {
        let (record, source) = match old.get(idx_old) {
            Some(existing) if existing.key() == candidate.key() => {
                idx_old += 1;
                (existing.clone(), RowSource::Reused)
            }
            _ => synthesize(candidate, width_new, width_old),
        };
        debug!("Record {idx} key '{}': {source}", candidate.key());
        records.push(record);
        sources.push(source);
    }

    let orphans = old[idx_old..].to_vec();
    if !orphans.is_empty() {
        let keys = orphans.iter().map(Row::key).join(", ");
        match options.orphans {
            OrphanPolicy::Drop => {
                debug!("{} old record(s) left unmatched: {keys}", orphans.len());
            }
            OrphanPolicy::Fail => {
                return Err(EvolveError::SchemaMismatch(format!(
                    "old record(s) not present in the new table: {keys}"
                )));
            }
        }
    }

    Ok(MergeOutcome {
        axis: options.axis,
        records,
        sources,
        orphans,
    })
}

fn synthesize(template: &Row, width_new: usize, width_old: usize) -> (Row, RowSource) {
    match width_new.cmp(&width_old) {
        Ordering::Equal => (template.clone(), RowSource::Template),
        Ordering::Greater => (
            template.truncated(width_old),
            RowSource::Truncated {
                dropped: width_new - width_old,
            },
        ),
        Ordering::Less => (
            template.padded(width_old),
            RowSource::Padded {
                added: width_old - width_new,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::parse_rows;

    fn columns(lines: &[&str]) -> Vec<Row> {
        transpose(&parse_rows(lines, b',')).expect("well-formed fixture")
    }

    fn merge_rows(new: &[&str], old: &[&str], options: MergeOptions) -> Result<MergeOutcome> {
        merge(&columns(new), &columns(old), &options)
    }

    #[test]
    fn matched_rows_are_reused_verbatim() {
        let outcome = merge_rows(
            &["k,a,b", "x,1,2", "y,3,4"],
            &["k,a,b", "x,7,8", "y,9,0"],
            MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(
            outcome.rows().expect("rows"),
            parse_rows(["k,a,b", "x,7,8", "y,9,0"], b',')
        );
        assert_eq!(outcome.count(|s| *s == RowSource::Reused), 3);
    }

    #[test]
    fn unmatched_row_uses_template_when_widths_agree() {
        let outcome = merge_rows(
            &["k,a", "x,1", "n,5", "y,3"],
            &["k,a", "x,7", "y,9"],
            MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(
            outcome.rows().expect("rows"),
            parse_rows(["k,a", "x,7", "n,5", "y,9"], b',')
        );
        assert_eq!(outcome.sources()[2], RowSource::Template);
        assert!(outcome.orphans().is_empty());
    }

    #[test]
    fn wider_template_rows_are_truncated() {
        let outcome = merge_rows(
            &["k,b,c,d,e", "a,b,c,d,e"],
            &["k,b,c"],
            MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(outcome.records()[1], Row::new(["a", "b", "c"]));
        assert_eq!(outcome.sources()[1], RowSource::Truncated { dropped: 2 });
    }

    #[test]
    fn narrower_template_rows_are_padded() {
        let outcome = merge_rows(&["k,b,c", "a,b,c"], &["k,b,c,d,e"], MergeOptions::default())
            .expect("merge");
        assert_eq!(outcome.records()[1], Row::new(["a", "b", "c", "c", "c"]));
        assert_eq!(outcome.sources()[1], RowSource::Padded { added: 2 });
    }

    #[test]
    fn scenario_with_added_column_keeps_old_width() {
        let outcome = merge_rows(
            &["k,v1,v2", "x,1,2", "y,3,4"],
            &["k,v1", "x,9"],
            MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(
            outcome.rows().expect("rows"),
            parse_rows(["k,v1", "x,9", "y,3"], b',')
        );
        assert_eq!(
            outcome.sources(),
            &[
                RowSource::Reused,
                RowSource::Reused,
                RowSource::Truncated { dropped: 1 }
            ]
        );
    }

    #[test]
    fn column_axis_adopts_new_layout() {
        let options = MergeOptions {
            axis: MergeAxis::Columns,
            ..MergeOptions::default()
        };
        let outcome = merge_rows(
            &["k,v1,v2", "x,1,2", "y,3,4"],
            &["k,v1", "x,9"],
            options,
        )
        .expect("merge");
        assert_eq!(
            outcome.rows().expect("rows"),
            parse_rows(["k,v1,v2", "x,9,2"], b',')
        );
        assert_eq!(outcome.columns().expect("columns"), outcome.records());
    }

    #[test]
    fn column_axis_pads_new_columns_to_old_row_count() {
        let options = MergeOptions {
            axis: MergeAxis::Columns,
            ..MergeOptions::default()
        };
        let outcome = merge_rows(
            &["id,name,flag", "1,a,on"],
            &["id,name", "1,alice", "2,bob", "3,carol"],
            options,
        )
        .expect("merge");
        assert_eq!(
            outcome.rows().expect("rows"),
            parse_rows(
                ["id,name,flag", "1,alice,on", "2,bob,on", "3,carol,on"],
                b','
            )
        );
    }

    #[test]
    fn row_count_guard_rejects_shrinking_table() {
        let err = merge_rows(&["k,a", "x,1"], &["k,a", "x,1", "y,2"], MergeOptions::default())
            .expect_err("new has fewer rows");
        assert_eq!(err, EvolveError::RowCount { new: 2, old: 3 });
    }

    #[test]
    fn reconcile_rejects_empty_sides() {
        let rows = parse_rows(["k,a"], b',');
        let options = MergeOptions::default();
        assert_eq!(
            reconcile(&rows, &[], &options),
            Err(EvolveError::RowCount { new: 1, old: 0 })
        );
        assert_eq!(
            reconcile(&[], &rows, &options),
            Err(EvolveError::RowCount { new: 0, old: 1 })
        );
    }

    #[test]
    fn row_count_guard_rejects_empty_tables() {
        let new = columns(&["k,a", "x,1"]);
        let err = merge(&new, &[], &MergeOptions::default()).expect_err("old empty");
        assert_eq!(err, EvolveError::RowCount { new: 2, old: 0 });
        let err = merge(&[], &[], &MergeOptions::default()).expect_err("both empty");
        assert_eq!(err, EvolveError::RowCount { new: 0, old: 0 });
    }

    #[test]
    fn orphaned_old_rows_are_dropped_by_default() {
        let outcome = merge_rows(
            &["k,a", "x,1", "y,2"],
            &["k,a", "gone,0"],
            MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(outcome.orphans(), &[Row::new(["gone", "0"])]);
        assert_eq!(
            outcome.rows().expect("rows"),
            parse_rows(["k,a", "x,1", "y,2"], b',')
        );
    }

    #[test]
    fn orphaned_old_rows_fail_when_requested() {
        let options = MergeOptions {
            orphans: OrphanPolicy::Fail,
            ..MergeOptions::default()
        };
        let err = merge_rows(&["k,a", "x,1", "y,2"], &["k,a", "gone,0"], options)
            .expect_err("orphan");
        assert!(matches!(err, EvolveError::SchemaMismatch(msg) if msg.contains("gone")));
    }

    #[test]
    fn reordered_keys_leave_skipped_rows_orphaned() {
        let outcome = merge_rows(
            &["k,a", "x,1", "y,2", "z,3"],
            &["k,a", "y,8", "x,7"],
            MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(
            outcome.rows().expect("rows"),
            parse_rows(["k,a", "x,1", "y,8", "z,3"], b',')
        );
        assert_eq!(outcome.orphans(), &[Row::new(["x", "7"])]);
    }
}
