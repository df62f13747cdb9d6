// Loading and pivoting the poll answers.

use log::debug;
use snafu::prelude::*;

use std::collections::HashMap;

use crate::dashboard::{
    DashboardResult, MissingPollColumnSnafu, ParsingCsvSnafu, PollSpec,
};
use crate::divide::io_common::strip_bom;

/// One respondent with one pick per slot, in slot order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollRow {
    pub respondent: String,
    pub sort_key: u64,
    pub picks: Vec<String>,
}

/// Parses the answer CSV. Duplicate respondents keep their last row; rows
/// come back sorted by the numeric component of the respondent key.
pub fn load_rows(spec: &PollSpec, body: &str) -> DashboardResult<Vec<PollRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(body.as_bytes());
    let mut records = rdr.records();

    let header: Vec<String> = match records.next() {
        Some(line_r) => {
            let line = line_r.context(ParsingCsvSnafu {})?;
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
        None => {
            return MissingPollColumnSnafu {
                column: spec.respondent_column.clone(),
            }
            .fail();
        }
    };
    debug!("load_rows: header: {:?}", header);

    let index_of = |column: &str| header.iter().position(|h| h == column);
    let respondent_idx = index_of(&spec.respondent_column).context(MissingPollColumnSnafu {
        column: spec.respondent_column.clone(),
    })?;
    let mut slot_idxs: Vec<usize> = Vec::new();
    for s in spec.slots.iter() {
        let idx = index_of(&s.column).context(MissingPollColumnSnafu {
            column: s.column.clone(),
        })?;
        slot_idxs.push(idx);
    }

    let mut latest: HashMap<String, PollRow> = HashMap::new();
    for line_r in records {
        let line = line_r.context(ParsingCsvSnafu {})?;
        let raw = line.get(respondent_idx).unwrap_or("").trim().to_string();
        if raw.is_empty() {
            continue;
        }
        let picks: Vec<String> = slot_idxs
            .iter()
            .map(|&i| line.get(i).unwrap_or("").trim().to_string())
            .collect();
        let sort_key = raw.parse::<u64>().unwrap_or(u64::MAX);
        latest.insert(
            raw.clone(),
            PollRow {
                respondent: format!("{}{}", spec.respondent_prefix, raw),
                sort_key,
                picks,
            },
        );
    }

    let mut rows: Vec<PollRow> = latest.into_values().collect();
    rows.sort_by(|a, b| (a.sort_key, &a.respondent).cmp(&(b.sort_key, &b.respondent)));
    Ok(rows)
}

/// The fallback data when no source is configured or the source is down:
/// every respondent gets a distinct rotation of the choices, so the page
/// is stable across refreshes.
pub fn demo_rows(spec: &PollSpec) -> Vec<PollRow> {
    (1..=32usize)
        .map(|i| {
            let picks = (0..spec.slots.len())
                .map(|j| spec.choices[(i + j) % spec.choices.len()].clone())
                .collect();
            PollRow {
                respondent: format!("{}{}", spec.respondent_prefix, i),
                sort_key: i as u64,
                picks,
            }
        })
        .collect()
}

/// For one respondent, the slot indexes matching each choice.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PivotRow {
    pub respondent: String,
    pub matches: Vec<Vec<usize>>,
}

pub fn pivot_rows(spec: &PollSpec, rows: &[PollRow]) -> Vec<PivotRow> {
    rows.iter()
        .map(|row| {
            let matches = spec
                .choices
                .iter()
                .map(|choice| {
                    row.picks
                        .iter()
                        .enumerate()
                        .filter_map(|(slot_ix, pick)| {
                            if pick == choice {
                                Some(slot_ix)
                            } else {
                                None
                            }
                        })
                        .collect()
                })
                .collect();
            PivotRow {
                respondent: row.respondent.clone(),
                matches,
            }
        })
        .collect()
}

/// How many respondents picked the given choice in each slot.
pub fn slot_counts(spec: &PollSpec, rows: &[PollRow], choice_ix: usize) -> Vec<u64> {
    let choice = &spec.choices[choice_ix];
    (0..spec.slots.len())
        .map(|slot_ix| {
            rows.iter()
                .filter(|row| row.picks.get(slot_ix).map(|p| p == choice).unwrap_or(false))
                .count() as u64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::poll_preset;

    fn body(lines: &[&str]) -> String {
        let mut s = String::from("timestamp,team,answer [pink],answer [blue],answer [green],answer [red]\n");
        for l in lines {
            s.push_str(l);
            s.push('\n');
        }
        s
    }

    #[test]
    fn rows_parse_and_sort_numerically() {
        let spec = poll_preset("sport").unwrap();
        let b = body(&[
            "t1,10,Aquarius,Dakara,Love Sports,Pocari Sweat",
            "t2,2,Pocari Sweat,Aquarius,Dakara,Love Sports",
        ]);
        let rows = load_rows(&spec, &b).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].respondent, "Team 2");
        assert_eq!(rows[1].respondent, "Team 10");
        assert_eq!(rows[0].picks[0], "Pocari Sweat");
    }

    #[test]
    fn duplicate_respondents_keep_the_last_answer() {
        let spec = poll_preset("sport").unwrap();
        let b = body(&[
            "t1,3,Aquarius,Dakara,Love Sports,Pocari Sweat",
            "t2,3,Pocari Sweat,Aquarius,Dakara,Love Sports",
        ]);
        let rows = load_rows(&spec, &b).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].picks[0], "Pocari Sweat");
    }

    #[test]
    fn missing_answer_column_is_an_error() {
        let spec = poll_preset("sport").unwrap();
        let b = "team,answer [pink]\n1,Aquarius\n";
        assert!(load_rows(&spec, b).is_err());
    }

    #[test]
    fn demo_rows_are_stable_and_distinct() {
        let spec = poll_preset("tea").unwrap();
        let a = demo_rows(&spec);
        let b = demo_rows(&spec);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        for row in a.iter() {
            // Each slot holds a different choice.
            let mut picks = row.picks.clone();
            picks.sort();
            picks.dedup();
            assert_eq!(picks.len(), spec.slots.len());
        }
    }

    #[test]
    fn pivot_collects_matching_slots() {
        let spec = poll_preset("sport").unwrap();
        let b = body(&["t1,1,Pocari Sweat,Pocari Sweat,Dakara,Aquarius"]);
        let rows = load_rows(&spec, &b).unwrap();
        let pivot = pivot_rows(&spec, &rows);
        // Pocari Sweat was picked for both pink (0) and blue (1).
        assert_eq!(pivot[0].matches[0], vec![0, 1]);
        // Aquarius only for red (3).
        assert_eq!(pivot[0].matches[1], vec![3]);
        // Love Sports nowhere.
        assert_eq!(pivot[0].matches[3], Vec::<usize>::new());
    }

    #[test]
    fn counts_follow_the_slots() {
        let spec = poll_preset("sport").unwrap();
        let b = body(&[
            "t1,1,Pocari Sweat,Aquarius,Dakara,Love Sports",
            "t2,2,Pocari Sweat,Dakara,Aquarius,Love Sports",
        ]);
        let rows = load_rows(&spec, &b).unwrap();
        assert_eq!(slot_counts(&spec, &rows, 0), vec![2, 0, 0, 0]);
        assert_eq!(slot_counts(&spec, &rows, 1), vec![0, 1, 1, 0]);
    }
}
