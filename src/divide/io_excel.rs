// Primitives for reading Excel rosters.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::divide::config_reader::FileSource;
use crate::divide::{
    DivideResult, EmptyExcelSnafu, ExcelWrongCellTypeSnafu, OpeningExcelSnafu, ParsedRosterRow,
};

pub fn read_excel_roster(path: String, cfs: &FileSource) -> DivideResult<Vec<ParsedRosterRow>> {
    let wrange = get_range(&path, cfs)?;

    let header_row = wrange.rows().next().context(EmptyExcelSnafu {})?;
    let header: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| cell_to_string(cell, 1, idx))
        .collect::<DivideResult<_>>()?;
    debug!("read_excel_roster: header: {:?}", header);

    let mut iter = wrange.rows();
    iter.next();
    let mut res: Vec<ParsedRosterRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // Row 1 is the header.
        let lineno = idx + 2;
        debug!("read_excel_roster: lineno: {:?} row: {:?}", lineno, row);
        let mut fields = std::collections::HashMap::new();
        for (i, name) in header.iter().enumerate() {
            let value = match row.get(i) {
                Some(cell) => cell_to_string(cell, lineno, i)?,
                None => String::new(),
            };
            fields.insert(name.clone(), value);
        }
        res.push(ParsedRosterRow { lineno, fields });
    }
    Ok(res)
}

/// Renders a cell to the string the CSV reader would have produced for it.
fn cell_to_string(cell: &DataType, lineno: usize, _col: usize) -> DivideResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok(String::new()),
        DataType::Float(f) => Ok(format!("{}", f)),
        DataType::Int(i) => Ok(format!("{}", i)),
        DataType::Bool(b) => Ok(format!("{}", b)),
        _ => ExcelWrongCellTypeSnafu {
            lineno: lineno as u64,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn get_range(path: &String, cfs: &FileSource) -> DivideResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_roster: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let p = path.clone();
    let mut workbook: Xlsx<_> =
        open_workbook(p).context(OpeningExcelSnafu { path: path.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => whatever!("The workbook {} has no worksheet", path),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_roster: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => {
                whatever!(
                    "The workbook {} has several worksheets, excelWorksheetName must be provided",
                    path
                )
            }
        }
    }
}
