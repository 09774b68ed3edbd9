use std::{fs, io, path::Path};

pub const DATAFLOWS_FILE: &str = "dataflows.txt";
pub const CODELISTS_FILE: &str = "codelists.txt";

const COLUMN_GAP: &str = "  ";

/// A flat record that can be laid out as a table row.
pub trait Tabular {
    const HEADERS: &'static [&'static str];

    /// One cell per header, in the same order.
    fn cells(&self) -> Vec<&str>;
}

fn row(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join(COLUMN_GAP).trim_end().to_string()
}

/// Plain-text table: header row, a dashed rule, then one left-aligned row per record.
pub fn render_table<T: Tabular>(records: &[T]) -> String {
    let rows: Vec<Vec<&str>> = records.iter().map(Tabular::cells).collect();
    let widths: Vec<usize> = T::HEADERS
        .iter()
        .enumerate()
        .map(|(column, header)| {
            rows.iter()
                .filter_map(|cells| cells.get(column))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let mut lines = vec![row(T::HEADERS, &widths), rule.join(COLUMN_GAP)];
    lines.extend(rows.iter().map(|cells| row(cells, &widths)));

    let mut table = lines.join("\n");
    table.push('\n');
    table
}

pub fn write_table<T: Tabular>(path: &Path, records: &[T]) -> io::Result<()> {
    fs::write(path, render_table(records))
}
