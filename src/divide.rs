use log::info;

use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use team_assign::builder::Builder;
use team_assign::*;

use crate::divide::config_reader::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod report;

#[derive(Debug, Snafu)]
pub enum DivideError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display(""))]
    EmptyExcel {},
    #[snafu(display("Line {lineno}: unexpected cell content {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display(""))]
    MissingParentDir {},

    #[snafu(display("Error opening {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },

    #[snafu(display("Missing column {column} in the roster header"))]
    MissingColumn { column: String },
    #[snafu(display("Line {lineno}: unknown status label {label}"))]
    UnknownStatus { lineno: usize, label: String },
    #[snafu(display("The roster contains no confirmed participant"))]
    EmptyRoster {},

    #[snafu(display("Error creating directory {path}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    CsvWrite { source: csv::Error, path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DivideResult<T> = Result<T, DivideError>;

/// A roster row, as parsed by the readers.
/// Cells are keyed by the header name; interpretation happens later.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRosterRow {
    pub lineno: usize,
    pub fields: HashMap<String, String>,
}

/// A confirmed participant, normalized and carrying its generated member id.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Participant {
    pub raw_id: String,
    pub display_name: String,
    pub status_label: String,
    pub org_abbr: String,
    pub member_id: String,
    pub status: EmploymentStatus,
}

pub fn run_divide(
    config_path: String,
    input_override: Option<String>,
    out_override: Option<String>,
    reference_path: Option<String>,
) -> DivideResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config_str = fs::read_to_string(&config_path).context(OpeningJsonSnafu {
        path: config_path.clone(),
    })?;
    let config: AssignConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);

    let rules = validate_rules(&config.rules)?;

    let mut rows: Vec<ParsedRosterRow> = Vec::new();
    if let Some(input) = input_override {
        let mut file_data = read_roster_override(&input)?;
        rows.append(&mut file_data);
    } else {
        if config.roster_file_sources.is_empty() {
            whatever!("No roster file sources declared in the configuration");
        }
        let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
        for cfs in config.roster_file_sources.iter() {
            let mut file_data =
                read_roster_data(root_p.as_os_str().to_str().unwrap_or(".").to_string(), cfs)?;
            rows.append(&mut file_data);
        }
    }

    let participants = validate_roster(&rows, &config)?;
    info!("Confirmed participants: {}", participants.len());

    let mut builder = match Builder::new(&rules) {
        Result::Ok(b) => b,
        Result::Err(e) => whatever!("Assignment error: {:?}", e),
    };
    for p in participants.iter() {
        if let Err(e) = builder.add_member(&p.member_id, &p.org_abbr, p.status) {
            whatever!("Assignment error: {:?}", e);
        }
    }
    let result = match builder.run() {
        Result::Ok(x) => x,
        Result::Err(e) => whatever!("Assignment error: {:?}", e),
    };

    info!(
        "Assignment done: {} round-1 teams, {} round-2 teams, {} unassigned",
        result.round1.len(),
        result.round2.len(),
        result.unassigned.len()
    );

    report::write_reports(
        &config,
        &participants,
        &result,
        out_override.as_deref(),
        reference_path.as_deref(),
    )
}

/// Maps the optional configuration fields onto the library rules.
fn validate_rules(raw: &RawRules) -> DivideResult<AssignmentRules> {
    let defaults = AssignmentRules::DEFAULT_RULES;
    let rules = AssignmentRules {
        team_size: raw.team_size.unwrap_or(defaults.team_size),
        home_incoming_count: raw
            .home_incoming_count
            .unwrap_or(defaults.home_incoming_count),
        attach_batch_size: raw.attach_batch_size.unwrap_or(defaults.attach_batch_size),
        shuffle_seed: raw.shuffle_seed.unwrap_or(defaults.shuffle_seed),
    };
    if rules.team_size < 2 {
        whatever!("teamSize must be at least 2, got {}", rules.team_size);
    }
    if rules.home_incoming_count + 1 > rules.team_size {
        whatever!(
            "homeIncomingCount {} does not fit in a team of {}",
            rules.home_incoming_count,
            rules.team_size
        );
    }
    Ok(rules)
}

fn read_roster_data(root_path: String, cfs: &FileSource) -> DivideResult<Vec<ParsedRosterRow>> {
    let p: PathBuf = [root_path, cfs.file_path.clone()].iter().collect();
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read roster file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_roster(p2),
        "excel" => io_excel::read_excel_roster(p2, cfs),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

/// Reads a roster passed with `--input`, inferring the provider from the
/// extension.
fn read_roster_override(path: &str) -> DivideResult<Vec<ParsedRosterRow>> {
    info!("Attempting to read roster file {:?}", path);
    let is_excel = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if is_excel {
        let cfs = FileSource {
            provider: "excel".to_string(),
            file_path: path.to_string(),
            excel_worksheet_name: None,
        };
        io_excel::read_excel_roster(path.to_string(), &cfs)
    } else {
        io_csv::read_csv_roster(path.to_string())
    }
}

/// Normalizes a raw organization cell to its configured abbreviation.
///
/// The first rule whose abbreviation matches exactly or whose pattern list
/// contains a substring of the cell wins; everything else falls back.
pub fn normalize_org(raw: &str, orgs: &[OrgRule], fallback: &str) -> String {
    for rule in orgs.iter() {
        if raw == rule.abbreviation {
            return rule.abbreviation.clone();
        }
        if rule.patterns.iter().any(|p| raw.contains(p.as_str())) {
            return rule.abbreviation.clone();
        }
    }
    fallback.to_string()
}

fn field<'a>(row: &'a ParsedRosterRow, column: &str) -> DivideResult<&'a str> {
    row.fields
        .get(column)
        .map(|s| s.as_str())
        .context(MissingColumnSnafu { column })
}

/// Filters the parsed rows to confirmed participants, normalizes their
/// organization and assigns member ids.
///
/// The member id is `<ORG>_<STATUS-LABEL>_<NNNN>`, with `NNNN` counted per
/// (organization, status) pair in roster order, so ids are stable across runs
/// for an unchanged roster.
pub fn validate_roster(
    rows: &[ParsedRosterRow],
    config: &AssignConfig,
) -> DivideResult<Vec<Participant>> {
    let cols = &config.columns;
    let mut participants: Vec<Participant> = Vec::new();
    let mut counters: HashMap<String, u32> = HashMap::new();

    for row in rows.iter() {
        let attendance = field(row, &cols.attendance)?;
        if attendance != config.participation_label {
            continue;
        }

        let status_label = field(row, &cols.status)?.to_string();
        let status = if status_label == config.status_labels.employee {
            EmploymentStatus::Employee
        } else if status_label == config.status_labels.incoming {
            EmploymentStatus::Incoming
        } else {
            return UnknownStatusSnafu {
                lineno: row.lineno,
                label: status_label,
            }
            .fail();
        };

        let raw_org = field(row, &cols.organization)?;
        let org_abbr = normalize_org(raw_org, &config.organizations, &config.fallback_organization);

        let counter_key = format!("{}_{}", org_abbr, status_label);
        let n = counters.entry(counter_key).or_insert(0);
        *n += 1;
        let member_id = format!("{}_{}_{:04}", org_abbr, status_label, n);

        participants.push(Participant {
            raw_id: field(row, &cols.id)?.to_string(),
            display_name: field(row, &cols.name)?.to_string(),
            status_label,
            org_abbr,
            member_id,
            status,
        });
    }

    if participants.is_empty() {
        return EmptyRosterSnafu {}.fail();
    }
    Ok(participants)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AssignConfig {
        let config_str = r#"{
            "outputSettings": {
                "eventName": "Onboarding mixer",
                "outputDirectory": "out",
                "eventDate": "2026-04-01"
            },
            "rosterFileSources": [
                {"provider": "csv", "filePath": "roster.csv"}
            ],
            "columns": {
                "id": "registration_id",
                "name": "name",
                "status": "status",
                "attendance": "attendance",
                "organization": "company"
            },
            "organizations": [
                {"abbreviation": "ACME", "patterns": ["Acme Corporation", "Acme Corp"]},
                {"abbreviation": "GLOBEX", "patterns": ["Globex"]}
            ],
            "fallbackOrganization": "TBD",
            "participationLabel": "attending",
            "statusLabels": {"employee": "employee", "incoming": "incoming"},
            "rules": {"teamSize": 6, "shuffleSeed": 42}
        }"#;
        serde_json::from_str(config_str).unwrap()
    }

    fn row(lineno: usize, cells: &[(&str, &str)]) -> ParsedRosterRow {
        ParsedRosterRow {
            lineno,
            fields: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn roster_row(
        lineno: usize,
        id: &str,
        name: &str,
        status: &str,
        attendance: &str,
        company: &str,
    ) -> ParsedRosterRow {
        row(
            lineno,
            &[
                ("registration_id", id),
                ("name", name),
                ("status", status),
                ("attendance", attendance),
                ("company", company),
            ],
        )
    }

    #[test]
    fn config_parses_with_partial_rules() {
        let config = test_config();
        assert_eq!(config.columns.organization, "company");
        let rules = validate_rules(&config.rules).unwrap();
        // Unspecified fields take the library defaults.
        assert_eq!(rules.home_incoming_count, 2);
        assert_eq!(rules.team_size, 6);
    }

    #[test]
    fn inconsistent_config_rules_are_rejected() {
        let mut config = test_config();
        config.rules.home_incoming_count = Some(7);
        assert!(validate_rules(&config.rules).is_err());
    }

    #[test]
    fn org_normalization_prefers_rule_order() {
        let config = test_config();
        let orgs = &config.organizations;
        assert_eq!(normalize_org("Acme Corporation Ltd.", orgs, "TBD"), "ACME");
        assert_eq!(normalize_org("ACME", orgs, "TBD"), "ACME");
        assert_eq!(normalize_org("Globex industries", orgs, "TBD"), "GLOBEX");
        assert_eq!(normalize_org("Initech", orgs, "TBD"), "TBD");
        assert_eq!(normalize_org("undecided", orgs, "TBD"), "TBD");
    }

    #[test]
    fn roster_filters_and_numbers_members() {
        let config = test_config();
        let rows = vec![
            roster_row(1, "r1", "Ana", "employee", "attending", "Acme Corp"),
            roster_row(2, "r2", "Ben", "incoming", "attending", "Acme Corp"),
            roster_row(3, "r3", "Carla", "incoming", "declined", "Acme Corp"),
            roster_row(4, "r4", "Dan", "incoming", "attending", "Globex"),
            roster_row(5, "r5", "Eli", "incoming", "attending", "Acme Corporation"),
        ];
        let participants = validate_roster(&rows, &config).unwrap();
        // Carla declined.
        assert_eq!(participants.len(), 4);
        let ids: Vec<&str> = participants.iter().map(|p| p.member_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "ACME_employee_0001",
                "ACME_incoming_0001",
                "GLOBEX_incoming_0001",
                "ACME_incoming_0002"
            ]
        );
    }

    #[test]
    fn unknown_status_is_an_error() {
        let config = test_config();
        let rows = vec![roster_row(1, "r1", "Ana", "contractor", "attending", "Acme Corp")];
        let res = validate_roster(&rows, &config);
        assert!(matches!(
            res,
            Err(DivideError::UnknownStatus { lineno: 1, .. })
        ));
    }

    #[test]
    fn empty_filtered_roster_is_an_error() {
        let config = test_config();
        let rows = vec![roster_row(1, "r1", "Ana", "employee", "declined", "Acme Corp")];
        assert!(matches!(
            validate_roster(&rows, &config),
            Err(DivideError::EmptyRoster {})
        ));
    }

    #[test]
    fn missing_column_is_an_error() {
        let config = test_config();
        let rows = vec![row(1, &[("registration_id", "r1")])];
        assert!(matches!(
            validate_roster(&rows, &config),
            Err(DivideError::MissingColumn { .. })
        ));
    }

    #[test]
    fn end_to_end_run_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");

        let mut roster = String::from("registration_id,name,status,attendance,company\n");
        roster.push_str("r0,Ana,employee,attending,Acme Corp\n");
        for i in 0..7 {
            roster.push_str(&format!("a{},Acme Hire {},incoming,attending,Acme Corp\n", i, i));
        }
        for i in 0..6 {
            roster.push_str(&format!("g{},Globex Hire {},incoming,attending,Globex\n", i, i));
        }
        roster.push_str("x0,Xan,incoming,declined,Globex\n");
        fs::write(dir.path().join("roster.csv"), roster).unwrap();

        let config = serde_json::json!({
            "outputSettings": {
                "eventName": "Mixer",
                "outputDirectory": out_dir.display().to_string(),
                "eventDate": null
            },
            "rosterFileSources": [{"provider": "csv", "filePath": "roster.csv"}],
            "columns": {
                "id": "registration_id",
                "name": "name",
                "status": "status",
                "attendance": "attendance",
                "organization": "company"
            },
            "organizations": [
                {"abbreviation": "ACME", "patterns": ["Acme"]},
                {"abbreviation": "GLOBEX", "patterns": ["Globex"]}
            ],
            "fallbackOrganization": "TBD",
            "participationLabel": "attending",
            "statusLabels": {"employee": "employee", "incoming": "incoming"},
            "rules": {}
        });
        let config_p = dir.path().join("config.json");
        fs::write(&config_p, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let config_s = config_p.display().to_string();

        run_divide(config_s.clone(), None, None, None).unwrap();

        let summary_p = out_dir.join("summary.json");
        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary_p).unwrap()).unwrap();
        // 14 confirmed participants: one full employee team, one batched team
        // and 2 leftovers.
        assert_eq!(summary["rounds"][0]["teams"].as_array().unwrap().len(), 2);
        assert_eq!(summary["unassigned"].as_array().unwrap().len(), 2);
        assert!(out_dir.join("r1_teams.csv").exists());
        assert!(out_dir.join("r2_teams.csv").exists());
        assert!(out_dir.join("participants.csv").exists());

        // A second run reproduces the pinned summary exactly.
        run_divide(
            config_s,
            None,
            None,
            Some(summary_p.display().to_string()),
        )
        .unwrap();
    }
}
