use crate::error::EmptyBatchError;
use crate::results::BatchEntry;

/// Row labels of the pivoted layout, in output order
pub const ROW_LABELS: [&str; 4] = ["TITULO", "BAJADA", "LINK", "IMAGEN"];

/// Column-oriented table: one column per record, one row per field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotedGrid {
    /// `""` followed by each entry's label
    pub header: Vec<String>,

    /// Field rows, each starting with its label from [`ROW_LABELS`]
    pub rows: Vec<Vec<String>>,
}

impl PivotedGrid {
    /// Header followed by the field rows
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// Number of record columns, not counting the label column
    pub fn width(&self) -> usize {
        self.header.len().saturating_sub(1)
    }
}

/// Pivots records into the fixed export layout, keeping batch order
pub fn pivot(batch: &[BatchEntry]) -> Result<PivotedGrid, EmptyBatchError> {
    if batch.is_empty() {
        return Err(EmptyBatchError);
    }

    let header = std::iter::once(String::new())
        .chain(batch.iter().map(|e| e.label.clone()))
        .collect();

    let rows = ROW_LABELS
        .iter()
        .enumerate()
        .map(|(row, label)| {
            std::iter::once(label.to_string())
                .chain(batch.iter().map(|e| cell(e, row).to_string()))
                .collect()
        })
        .collect();

    ::log::debug!("Pivoted {} records", batch.len());
    Ok(PivotedGrid { header, rows })
}

/// Value of `entry` for the field row at index `row` of [`ROW_LABELS`]
fn cell(entry: &BatchEntry, row: usize) -> &str {
    match row {
        0 => &entry.title,
        1 => &entry.subtitle,
        2 => &entry.link,
        _ => &entry.image,
    }
}
