// Live poll dashboards for the tasting games.
//
// The server re-reads the answer CSV on every page load; the page reloads
// itself on a fixed cadence, so the audience screen follows the incoming
// answers without any client-side code.

use log::{info, warn};
use snafu::{prelude::*, Snafu};

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

pub mod data;
pub mod render;

use crate::dashboard::data::{demo_rows, load_rows, PollRow};

#[derive(Debug, Snafu)]
pub enum DashboardError {
    #[snafu(display("Unknown poll preset {slug}"))]
    UnknownPoll { slug: String },
    #[snafu(display("Error starting the async runtime"))]
    Runtime { source: std::io::Error },
    #[snafu(display("Error binding {addr}"))]
    Binding {
        source: std::io::Error,
        addr: String,
    },
    #[snafu(display("Error serving the dashboard"))]
    Serving { source: std::io::Error },
    #[snafu(display("Error fetching {url}"))]
    Fetching { source: reqwest::Error, url: String },
    #[snafu(display("Error reading {path}"))]
    ReadingSource {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the poll results"))]
    ParsingCsv { source: csv::Error },
    #[snafu(display("Missing column {column} in the poll results"))]
    MissingPollColumn { column: String },
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// One of the blind cups, identified by a color label.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Slot {
    pub name: String,
    /// The answer column holding this slot's pick.
    pub column: String,
    pub hex: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Theme {
    pub page_bg: String,
    pub title_color: String,
    pub title_shadow: String,
    pub card_shadow: String,
    pub hover_bg: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollSpec {
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub footer: String,
    pub respondent_column: String,
    /// Display prefix for the respondent key ("3" becomes "Team 3").
    pub respondent_prefix: String,
    pub choices: Vec<String>,
    pub slots: Vec<Slot>,
    pub theme: Theme,
}

fn slot(name: &str, column: &str, hex: &str) -> Slot {
    Slot {
        name: name.to_string(),
        column: column.to_string(),
        hex: hex.to_string(),
    }
}

pub fn poll_preset(slug: &str) -> Option<PollSpec> {
    match slug {
        "sport" => Some(PollSpec {
            slug: "sport".to_string(),
            title: "🥤 Question 1: Blind Sports-Drink Tasting 💧".to_string(),
            subtitle: "💪 Did everyone figure out which drink was which? 💪".to_string(),
            footer: "Onboarding mixer, sports-drink tasting game".to_string(),
            respondent_column: "team".to_string(),
            respondent_prefix: "Team ".to_string(),
            choices: vec![
                "Pocari Sweat".to_string(),
                "Aquarius".to_string(),
                "Dakara".to_string(),
                "Love Sports".to_string(),
            ],
            slots: vec![
                slot("Pink", "answer [pink]", "#fc81ac"),
                slot("Blue", "answer [blue]", "#5ddaf0"),
                slot("Green", "answer [green]", "#72C045"),
                slot("Red", "answer [red]", "#d92c06"),
            ],
            theme: Theme {
                page_bg: "#f0faff".to_string(),
                title_color: "#1e88e5".to_string(),
                title_shadow: "#b3e5fc".to_string(),
                card_shadow: "rgba(130,200,255,0.25)".to_string(),
                hover_bg: "rgba(224,247,250,0.6)".to_string(),
            },
        }),
        "tea" => Some(PollSpec {
            slug: "tea".to_string(),
            title: "🍵 Question 2: Blind Tea Tasting ☕".to_string(),
            subtitle: "🍡 Let's see who guessed right! 🍡".to_string(),
            footer: "Onboarding mixer, tea tasting game".to_string(),
            respondent_column: "team".to_string(),
            respondent_prefix: "Team ".to_string(),
            choices: vec![
                "Oi Ocha".to_string(),
                "Ayataka".to_string(),
                "Iyemon".to_string(),
                "Namacha".to_string(),
            ],
            slots: vec![
                slot("Red", "answer [red]", "#ff4b4b"),
                slot("Green", "answer [green]", "#4caf50"),
                slot("Blue", "answer [blue]", "#1e90ff"),
                slot("Purple", "answer [purple]", "#9c27b0"),
            ],
            theme: Theme {
                page_bg: "#fdf6ff".to_string(),
                title_color: "#7748c4".to_string(),
                title_shadow: "#ffc9e3".to_string(),
                card_shadow: "rgba(255,196,232,0.25)".to_string(),
                hover_bg: "rgba(255,240,245,0.6)".to_string(),
            },
        }),
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum SourceKind {
    Url(String),
    File(String),
}

pub struct DashboardState {
    spec: PollSpec,
    source: Option<SourceKind>,
    refresh_secs: u32,
}

fn resolve_source(
    source: Option<String>,
    sheet_id: Option<String>,
    gid: Option<String>,
) -> Option<SourceKind> {
    if let Some(s) = source {
        if s.starts_with("http://") || s.starts_with("https://") {
            Some(SourceKind::Url(s))
        } else {
            Some(SourceKind::File(s))
        }
    } else if let Some(id) = sheet_id {
        let gid = gid.unwrap_or_else(|| "0".to_string());
        Some(SourceKind::Url(format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
            id, gid
        )))
    } else {
        None
    }
}

pub fn run_dashboard(
    poll: String,
    source: Option<String>,
    sheet_id: Option<String>,
    gid: Option<String>,
    port: u16,
    refresh_secs: u32,
) -> DashboardResult<()> {
    let spec = poll_preset(&poll).context(UnknownPollSnafu { slug: poll })?;
    let source = resolve_source(source, sheet_id, gid);
    if source.is_none() {
        info!("No source configured, serving demo data");
    }
    let state = Arc::new(DashboardState {
        spec,
        source,
        refresh_secs,
    });
    let rt = tokio::runtime::Runtime::new().context(RuntimeSnafu {})?;
    rt.block_on(serve(state, port))
}

async fn serve(state: Arc<DashboardState>, port: u16) -> DashboardResult<()> {
    let slug = state.spec.slug.clone();
    let app = Router::new().route("/", get(poll_page)).with_state(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(BindingSnafu { addr })?;
    info!(
        "Serving the {} dashboard on http://localhost:{}/",
        slug, port
    );
    axum::serve(listener, app).await.context(ServingSnafu {})
}

async fn poll_page(State(state): State<Arc<DashboardState>>) -> Html<String> {
    let rows = match load(&state).await {
        Result::Ok(rows) => rows,
        Result::Err(e) => {
            // Never show an error page mid-event.
            warn!("Falling back to demo data: {}", e);
            demo_rows(&state.spec)
        }
    };
    Html(render::render_page(&state.spec, &rows, state.refresh_secs))
}

async fn load(state: &DashboardState) -> DashboardResult<Vec<PollRow>> {
    match &state.source {
        None => Ok(demo_rows(&state.spec)),
        Some(SourceKind::Url(url)) => {
            let resp = reqwest::get(url)
                .await
                .context(FetchingSnafu { url: url.clone() })?;
            let resp = resp
                .error_for_status()
                .context(FetchingSnafu { url: url.clone() })?;
            let body = resp
                .text()
                .await
                .context(FetchingSnafu { url: url.clone() })?;
            load_rows(&state.spec, &body)
        }
        Some(SourceKind::File(path)) => {
            let body = std::fs::read_to_string(path).context(ReadingSourceSnafu {
                path: path.clone(),
            })?;
            load_rows(&state.spec, &body)
        }
    }
}
