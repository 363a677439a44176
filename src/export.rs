use crate::batch::PivotedGrid;
use crate::error::Error;
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Name of the single worksheet
pub const SHEET_NAME: &str = "Datos";

/// File name offered for downloads
pub const DOWNLOAD_NAME: &str = "datos.xlsx";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Serializes the grid into an in-memory xlsx file
pub fn write_workbook(grid: &PivotedGrid) -> Result<Vec<u8>, Error> {
    let mut workbook = build_workbook(grid)?;
    let bytes = workbook.save_to_buffer()?;
    ::log::info!("Built workbook with {} columns ({} bytes)", grid.width(), bytes.len());
    Ok(bytes)
}

/// Serializes the grid into an xlsx file at `path`
pub fn save_workbook(grid: &PivotedGrid, path: impl AsRef<Path>) -> Result<(), Error> {
    let mut workbook = build_workbook(grid)?;
    workbook.save(path.as_ref())?;
    ::log::info!("Wrote workbook to {}", path.as_ref().display());
    Ok(())
}

fn build_workbook(grid: &PivotedGrid) -> Result<Workbook, Error> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (r, row) in grid.to_rows().iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let col = u16::try_from(c)
                .map_err(|_| Error::Validation(format!("too many records to export: {}", c)))?;
            worksheet.write_string(r as u32, col, value.as_str())?;
        }
    }

    Ok(workbook)
}
