// Primitives for reading CSV rosters.

use log::debug;
use snafu::prelude::*;

use crate::divide::io_common::{simplify_file_name, strip_bom};
use crate::divide::{CsvLineParseSnafu, CsvOpenSnafu, DivideResult, ParsedRosterRow};

pub fn read_csv_roster(path: String) -> DivideResult<Vec<ParsedRosterRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;
    let mut records = rdr.into_records();

    let header: Vec<String> = match records.next() {
        Some(line_r) => {
            let line = line_r.context(CsvLineParseSnafu { lineno: 1usize })?;
            line.iter()
                .enumerate()
                .map(|(idx, cell)| {
                    if idx == 0 {
                        strip_bom(cell).to_string()
                    } else {
                        cell.to_string()
                    }
                })
                .collect()
        }
        None => whatever!("The roster file {} is empty", path),
    };
    debug!(
        "read_csv_roster: {}: header: {:?}",
        simplify_file_name(&path),
        header
    );

    let mut res: Vec<ParsedRosterRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // Line 1 is the header.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_roster: lineno: {:?} row: {:?}", lineno, line);
        let fields = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), line.get(i).unwrap_or("").to_string()))
            .collect();
        res.push(ParsedRosterRow { lineno, fields });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn rows_are_keyed_by_header() {
        let f = write_temp_csv("name,company\nAna,Acme\nBen,Globex\n");
        let rows = read_csv_roster(f.path().display().to_string()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lineno, 2);
        assert_eq!(rows[0].fields["name"], "Ana");
        assert_eq!(rows[1].fields["company"], "Globex");
    }

    #[test]
    fn bom_header_is_normalized() {
        let f = write_temp_csv("\u{feff}name,company\nAna,Acme\n");
        let rows = read_csv_roster(f.path().display().to_string()).unwrap();
        assert_eq!(rows[0].fields["name"], "Ana");
    }

    #[test]
    fn empty_file_is_an_error() {
        let f = write_temp_csv("");
        assert!(read_csv_roster(f.path().display().to_string()).is_err());
    }
}
