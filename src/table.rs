//! Plain-text table rendering for merge plans.

use std::fmt::Write as _;

use crate::row::Row;

const GUTTER: &str = "  ";

pub fn render_table(header: &Row, rows: &[Row]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell_width(cell)).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(header.iter(), &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    let rule_widths: Vec<usize> = widths.iter().map(|w| (*w).max(3)).collect();
    let _ = writeln!(output, "{}", format_line(rule.iter(), &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row.iter(), &widths));
    }
    output
}

pub fn print_table(header: &Row, rows: &[Row]) {
    print!("{}", render_table(header, rows));
}

fn format_line<'a>(cells: impl Iterator<Item = &'a String>, widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.zip(widths.iter().copied()).enumerate() {
        if idx > 0 {
            line.push_str(GUTTER);
        }
        let cleaned = clean(cell);
        let _ = write!(line, "{cleaned:<width$}");
    }
    line.trim_end().to_string()
}

fn cell_width(cell: &str) -> usize {
    cell.chars().count()
}

fn clean(cell: &str) -> String {
    cell.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}
