use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::csv_io::KEY_HEADERS;
use crate::table::FeatureTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub rows: usize,
    pub columns: usize,
}

/// One "Features" worksheet: header row, then key and label cells as text or
/// integers and every feature as a numeric cell.
pub fn export_feature_table(path: &Path, table: &FeatureTable) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Features")?;
        write_header(sheet, table)?;
        write_rows(sheet, table)?;
        sheet.set_freeze_panes(1, 0)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        rows: table.len(),
        columns: KEY_HEADERS.len() + table.columns().len(),
    })
}

fn write_header(worksheet: &mut Worksheet, table: &FeatureTable) -> Result<()> {
    let names = KEY_HEADERS
        .iter()
        .copied()
        .chain(table.columns().iter().map(String::as_str));
    for (col_idx, name) in names.enumerate() {
        worksheet
            .write_string(0, col_idx as u16, name)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, table: &FeatureTable) -> Result<()> {
    for (idx, row) in table.rows().iter().enumerate() {
        let r = idx as u32 + 1;
        let cell = |col: usize| format!("write cell ({r},{col})");
        worksheet
            .write_number(r, 0, f64::from(row.key.season))
            .with_context(|| cell(0))?;
        worksheet
            .write_string(r, 1, row.key.date.format("%Y-%m-%d").to_string())
            .with_context(|| cell(1))?;
        worksheet
            .write_string(r, 2, &row.key.home_team)
            .with_context(|| cell(2))?;
        worksheet
            .write_string(r, 3, &row.key.away_team)
            .with_context(|| cell(3))?;
        worksheet
            .write_string(r, 4, row.result.code().to_string())
            .with_context(|| cell(4))?;
        worksheet
            .write_number(r, 5, f64::from(row.home_goals))
            .with_context(|| cell(5))?;
        worksheet
            .write_number(r, 6, f64::from(row.away_goals))
            .with_context(|| cell(6))?;

        let offset = KEY_HEADERS.len();
        for (col_idx, value) in row.values.iter().enumerate() {
            let col = offset + col_idx;
            worksheet
                .write_number(r, col as u16, *value)
                .with_context(|| cell(col))?;
        }
    }
    Ok(())
}
