use clap::{Parser, Subcommand};

/// Roster tooling for onboarding events: team assignment, roster
/// anonymization and live poll dashboards.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Builds the two rounds of team assignments from a roster file.
    Assign {
        /// (file path) The JSON file describing the roster sources, the organization
        /// normalization rules and the assignment rules.
        #[clap(short, long, value_parser)]
        config: String,

        /// (file path or empty) If specified, overrides the roster file declared in the
        /// configuration. The provider is inferred from the extension (.csv or .xlsx).
        #[clap(short, long, value_parser)]
        input: Option<String>,

        /// (directory path, 'stdout' or empty) Where the report files are written.
        /// Setting this option overrides the directory that may be specified in the
        /// configuration. With 'stdout', only the JSON summary is printed.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// (file path) A reference file containing the summary of a previous run in JSON
        /// format. If provided, the tool will check that the computed assignment matches
        /// the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },

    /// Replaces the personal columns of a roster export with synthetic values.
    Anonymize {
        /// (file path) The roster CSV to anonymize.
        #[clap(short, long, value_parser)]
        input: String,

        /// (file path) Where the anonymized CSV is written.
        #[clap(short, long, value_parser)]
        out: String,

        /// (column name) The display-name column. Skipped if absent from the header.
        #[clap(long, value_parser, default_value = "name")]
        name_column: String,

        /// (column name) The phonetic-reading column. Skipped if absent from the header.
        #[clap(long, value_parser, default_value = "name_reading")]
        reading_column: String,

        /// (column name) The email column. Skipped if absent from the header.
        #[clap(long, value_parser, default_value = "email")]
        email_column: String,
    },

    /// Serves a live results dashboard for one of the tasting polls.
    Dashboard {
        /// (sport or tea) The poll preset to render.
        #[clap(short, long, value_parser, default_value = "sport")]
        poll: String,

        /// (file path or URL) The CSV holding the poll answers. Re-read on every page
        /// load. When missing, built from --sheet-id/--gid, or demo data is shown.
        #[clap(short, long, value_parser)]
        source: Option<String>,

        /// (spreadsheet id) A published Google Sheets document to read the answers from.
        #[clap(long, value_parser)]
        sheet_id: Option<String>,

        /// (worksheet gid, default 0) The worksheet of --sheet-id to export.
        #[clap(long, value_parser)]
        gid: Option<String>,

        /// The port the dashboard listens on.
        #[clap(long, value_parser, default_value_t = 8080)]
        port: u16,

        /// How often the page reloads itself, in seconds.
        #[clap(long, value_parser, default_value_t = 3)]
        refresh_secs: u32,
    },
}
