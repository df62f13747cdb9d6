use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "eventDate")]
    pub event_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    #[serde(default)]
    pub excel_worksheet_name: Option<String>,
}

/// The header names of the roster columns the tool interprets. Any other
/// column is carried along untouched.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub id: String,
    pub name: String,
    pub status: String,
    pub attendance: String,
    pub organization: String,
}

/// One organization with the substrings its raw names contain.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OrgRule {
    pub abbreviation: String,
    pub patterns: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StatusLabels {
    pub employee: String,
    pub incoming: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawRules {
    #[serde(rename = "teamSize")]
    #[serde(default)]
    pub team_size: Option<u32>,
    #[serde(rename = "homeIncomingCount")]
    #[serde(default)]
    pub home_incoming_count: Option<u32>,
    #[serde(rename = "attachBatchSize")]
    #[serde(default)]
    pub attach_batch_size: Option<u32>,
    #[serde(rename = "shuffleSeed")]
    #[serde(default)]
    pub shuffle_seed: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AssignConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "rosterFileSources")]
    pub roster_file_sources: Vec<FileSource>,
    pub columns: ColumnSpec,
    pub organizations: Vec<OrgRule>,
    #[serde(rename = "fallbackOrganization")]
    pub fallback_organization: String,
    #[serde(rename = "participationLabel")]
    pub participation_label: String,
    #[serde(rename = "statusLabels")]
    pub status_labels: StatusLabels,
    pub rules: RawRules,
}
