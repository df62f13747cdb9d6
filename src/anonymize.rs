// Roster anonymization: personal columns are replaced with synthetic values,
// everything else is carried through verbatim.

use log::info;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::Write;

#[derive(Debug, Snafu)]
pub enum AnonymizeError {
    #[snafu(display("Error opening {path}"))]
    Opening { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno}"))]
    LineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing {path}"))]
    Writing { source: csv::Error, path: String },
    #[snafu(display("Error writing {path}"))]
    WritingIo {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The input file {path} has no header"))]
    EmptyInput { path: String },
}

pub type AnonymizeResult<T> = Result<T, AnonymizeError>;

/// The columns to replace. A column absent from the header is skipped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MaskColumns {
    pub name: String,
    pub reading: String,
    pub email: String,
}

const SURNAMES: [&str; 10] = [
    "Tanaka", "Sato", "Suzuki", "Takahashi", "Watanabe", "Ito", "Yamamoto", "Nakamura",
    "Kobayashi", "Kato",
];
const GIVEN_NAMES: [&str; 10] = [
    "Taro", "Hanako", "Ichiro", "Jiro", "Misaki", "Kenta", "Sakura", "Daisuke", "Ai", "Sho",
];

// The pools cycle, so two rows can share a synthetic name; only the email is
// guaranteed unique.
fn synthetic_name(index: usize) -> String {
    format!(
        "{} {}",
        SURNAMES[index % SURNAMES.len()],
        GIVEN_NAMES[(index / SURNAMES.len()) % GIVEN_NAMES.len()]
    )
}

fn synthetic_reading(index: usize) -> String {
    synthetic_name(index).to_uppercase()
}

fn synthetic_email(index: usize) -> String {
    format!("user{:03}@example.com", index + 1)
}

pub fn run_anonymize(input: String, out: String, columns: &MaskColumns) -> AnonymizeResult<()> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(&input)
        .context(OpeningSnafu {
            path: input.clone(),
        })?;
    let mut records = rdr.into_records();

    let header: Vec<String> = match records.next() {
        Some(line_r) => {
            let line = line_r.context(LineParseSnafu { lineno: 1usize })?;
            line.iter()
                .enumerate()
                .map(|(idx, cell)| {
                    if idx == 0 {
                        crate::divide::io_common::strip_bom(cell).to_string()
                    } else {
                        cell.to_string()
                    }
                })
                .collect()
        }
        None => {
            return EmptyInputSnafu { path: input }.fail();
        }
    };

    let index_of = |column: &str| header.iter().position(|h| h == column);
    let name_idx = index_of(&columns.name);
    let reading_idx = index_of(&columns.reading);
    let email_idx = index_of(&columns.email);

    let mut file = fs::File::create(&out).context(WritingIoSnafu { path: out.clone() })?;
    file.write_all(b"\xef\xbb\xbf")
        .context(WritingIoSnafu { path: out.clone() })?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(&header)
        .context(WritingSnafu { path: out.clone() })?;

    let mut count: usize = 0;
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(LineParseSnafu { lineno })?;
        let mut cells: Vec<String> = line.iter().map(|c| c.to_string()).collect();
        cells.resize(header.len(), String::new());

        if let Some(i) = name_idx {
            cells[i] = synthetic_name(idx);
        }
        if let Some(i) = reading_idx {
            cells[i] = synthetic_reading(idx);
        }
        if let Some(i) = email_idx {
            cells[i] = synthetic_email(idx);
        }

        wtr.write_record(&cells)
            .context(WritingSnafu { path: out.clone() })?;
        count += 1;
    }
    wtr.flush().context(WritingIoSnafu { path: out.clone() })?;

    info!("Anonymized {} records", count);
    println!("Anonymized {} records into {}", count, out);
    Ok(())
}
