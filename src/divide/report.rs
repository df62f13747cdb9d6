// Output tables, summary JSON and reference comparison.

use log::{info, warn};
use snafu::prelude::*;

use serde_json::json;
use serde_json::Value as JSValue;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use team_assign::{AssignmentResult, Team};
use text_diff::print_diff;

use crate::divide::config_reader::AssignConfig;
use crate::divide::{
    CreatingOutputDirSnafu, CsvWriteSnafu, DivideResult, OpeningJsonSnafu, Participant,
    ParsingJsonSnafu, WritingOutputSnafu,
};

fn team_to_json(team: &Team) -> JSValue {
    json!({
        "id": team.id,
        "organization": team.org,
        "employees": team.employee_count,
        "members": team.members,
    })
}

pub fn build_summary_js(config: &AssignConfig, result: &AssignmentResult) -> JSValue {
    let r1: Vec<JSValue> = result.round1.iter().map(team_to_json).collect();
    let r2: Vec<JSValue> = result.round2.iter().map(team_to_json).collect();
    json!({
        "config": {
            "event": config.output_settings.event_name,
            "date": config.output_settings.event_date,
        },
        "rounds": [
            {"round": 1, "teams": r1},
            {"round": 2, "teams": r2},
        ],
        "unassigned": result.unassigned,
    })
}

fn member_cell(member_id: &str, by_id: &HashMap<&str, &Participant>) -> String {
    let name = by_id
        .get(member_id)
        .map(|p| p.display_name.as_str())
        .unwrap_or("");
    format!("{} ({})", member_id, name)
}

/// Round-1 table: one row per team, with per-organization counts and the
/// number of distinct organizations mixed into the team.
pub fn r1_table(
    teams: &[Team],
    participants: &[Participant],
    orgs: &[String],
    team_size: usize,
) -> (Vec<String>, Vec<Vec<String>>) {
    let by_id: HashMap<&str, &Participant> = participants
        .iter()
        .map(|p| (p.member_id.as_str(), p))
        .collect();

    let mut header: Vec<String> = vec!["Team ID (R1)".to_string(), "Employees".to_string()];
    for i in 1..=team_size {
        header.push(format!("Member {}", i));
    }
    header.extend(orgs.iter().cloned());
    header.push("Orgs".to_string());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for team in teams.iter() {
        let mut row: Vec<String> = vec![team.id.clone(), team.employee_count.to_string()];
        for i in 0..team_size {
            match team.members.get(i) {
                Some(m) => row.push(member_cell(m, &by_id)),
                None => row.push(String::new()),
            }
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for org in orgs.iter() {
            let count = team
                .members
                .iter()
                .filter(|m| {
                    by_id
                        .get(m.as_str())
                        .map(|p| p.org_abbr == *org)
                        .unwrap_or(false)
                })
                .count();
            if count > 0 {
                seen.insert(org.as_str());
            }
            row.push(count.to_string());
        }
        row.push(seen.len().to_string());
        rows.push(row);
    }
    (header, rows)
}

/// Round-2 table: one row per team. Employee-anchored teams hold one more
/// member than the batched ones.
pub fn r2_table(
    teams: &[Team],
    participants: &[Participant],
    team_size: usize,
) -> (Vec<String>, Vec<Vec<String>>) {
    let by_id: HashMap<&str, &Participant> = participants
        .iter()
        .map(|p| (p.member_id.as_str(), p))
        .collect();

    let mut header: Vec<String> = vec!["Team ID (R2)".to_string(), "Organization".to_string()];
    for i in 1..=(team_size + 1) {
        header.push(format!("Member {}", i));
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for team in teams.iter() {
        let mut row: Vec<String> =
            vec![team.id.clone(), team.org.clone().unwrap_or_default()];
        for i in 0..(team_size + 1) {
            match team.members.get(i) {
                Some(m) => row.push(member_cell(m, &by_id)),
                None => row.push(String::new()),
            }
        }
        rows.push(row);
    }
    (header, rows)
}

pub fn participants_table(
    config: &AssignConfig,
    participants: &[Participant],
) -> (Vec<String>, Vec<Vec<String>>) {
    let header = vec![
        config.columns.id.clone(),
        config.columns.name.clone(),
        config.columns.status.clone(),
        "organization".to_string(),
        "member_id".to_string(),
    ];
    let rows = participants
        .iter()
        .map(|p| {
            vec![
                p.raw_id.clone(),
                p.display_name.clone(),
                p.status_label.clone(),
                p.org_abbr.clone(),
                p.member_id.clone(),
            ]
        })
        .collect();
    (header, rows)
}

/// Writes one CSV file, BOM-prefixed so spreadsheet applications open it as
/// UTF-8.
fn write_csv(path: &Path, header: &[String], rows: &[Vec<String>]) -> DivideResult<()> {
    let path_s = path.display().to_string();
    let mut file = fs::File::create(path).context(WritingOutputSnafu {
        path: path_s.clone(),
    })?;
    file.write_all(b"\xef\xbb\xbf").context(WritingOutputSnafu {
        path: path_s.clone(),
    })?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(header).context(CsvWriteSnafu {
        path: path_s.clone(),
    })?;
    for row in rows.iter() {
        wtr.write_record(row).context(CsvWriteSnafu {
            path: path_s.clone(),
        })?;
    }
    wtr.flush()
        .context(WritingOutputSnafu { path: path_s })?;
    Ok(())
}

pub fn write_reports(
    config: &AssignConfig,
    participants: &[Participant],
    result: &AssignmentResult,
    out_override: Option<&str>,
    reference_path: Option<&str>,
) -> DivideResult<()> {
    let rules = super::validate_rules(&config.rules)?;
    let team_size = rules.team_size as usize;

    let summary = build_summary_js(config, result);
    let pretty_stats = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;

    let out = out_override.or(config.output_settings.output_directory.as_deref());
    match out {
        Some("stdout") | None => {
            println!("{}", pretty_stats);
        }
        Some(dir) => {
            fs::create_dir_all(dir).context(CreatingOutputDirSnafu { path: dir })?;
            let dir_p = Path::new(dir);

            let orgs: Vec<String> = config
                .organizations
                .iter()
                .map(|o| o.abbreviation.clone())
                .chain(std::iter::once(config.fallback_organization.clone()))
                .collect();

            let (h, rows) = r1_table(&result.round1, participants, &orgs, team_size);
            write_csv(&dir_p.join("r1_teams.csv"), &h, &rows)?;
            let (h, rows) = r2_table(&result.round2, participants, team_size);
            write_csv(&dir_p.join("r2_teams.csv"), &h, &rows)?;
            let (h, rows) = participants_table(config, participants);
            write_csv(&dir_p.join("participants.csv"), &h, &rows)?;

            let summary_p = dir_p.join("summary.json");
            fs::write(&summary_p, &pretty_stats).context(WritingOutputSnafu {
                path: summary_p.display().to_string(),
            })?;
            info!("Reports written to {}", dir);
        }
    }

    // The reference summary, if provided for comparison.
    if let Some(ref_path) = reference_path {
        check_reference(&pretty_stats, ref_path)?;
    }
    Ok(())
}

fn read_summary(path: &str) -> DivideResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn check_reference(pretty_stats: &str, reference_path: &str) -> DivideResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty_stats, "\n");
        whatever!("Difference detected between computed summary and reference summary");
    }
    Ok(())
}
