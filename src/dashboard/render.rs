// Server-side HTML rendering of the poll page.

use crate::dashboard::data::{pivot_rows, slot_counts, PollRow};
use crate::dashboard::PollSpec;

const ROW_HEIGHT_PX: u32 = 18;
const FONT_SIZE_PX: u32 = 12;
const CELL_PADDING_V: u32 = 4;
const CELL_PADDING_H: u32 = 2;
const COLUMN_WIDTH_PX: u32 = 140;
const FIRST_COL_WIDTH_PX: u32 = 100;
const CHART_AREA_PX: u32 = 200;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page_css(spec: &PollSpec) -> String {
    let t = &spec.theme;
    format!(
        r#"body {{ background: {page_bg}; margin: 0; padding: 0 16px; }}
.header-title {{ font-size:36px; font-weight:900; text-align:center; color:{title_color}; margin:10px 0 4px 0; font-family:"Trebuchet MS",sans-serif; text-shadow:1px 2px {title_shadow}; }}
.sub-text {{ text-align:center; font-size:18px; margin-bottom:12px; color:#555; font-family:"Helvetica Neue",Arial,sans-serif; }}
.layout {{ display:flex; gap:16px; align-items:flex-start; }}
.card {{ border-radius:12px; background:#ffffffcc; padding:12px; margin-top:14px; box-shadow:0 4px 10px {card_shadow}; }}
.card-results {{ flex:1.2; }}
.card-charts {{ flex:2.3; }}
.compact-table {{
  border-collapse: collapse;
  width:100%;
  table-layout: fixed;
  font-size:{font_size}px;
  font-family: "Helvetica Neue", Arial, sans-serif;
  border: 1px solid rgba(0,0,0,0.06);
}}
.compact-table th {{
  position: sticky;
  top:0;
  background: rgba(255,255,255,0.95);
  font-weight:700;
  padding:{pad_v}px {pad_h}px;
  white-space: nowrap;
  overflow:hidden;
  text-overflow:ellipsis;
  border-bottom:1px solid rgba(0,0,0,0.06);
}}
.compact-table tr {{ height: {row_height}px; }}
.compact-table td {{
  padding:{pad_v}px {pad_h}px;
  overflow:hidden;
  text-overflow:ellipsis;
  white-space: nowrap;
  vertical-align:middle;
  border-bottom:1px solid rgba(0,0,0,0.03);
}}
.compact-table tbody tr:hover {{ background: {hover_bg}; }}
.charts-grid {{ display:grid; grid-template-columns:1fr 1fr; gap:12px; }}
.chart-title {{ text-align:center; font-weight:700; font-family:"Helvetica Neue",Arial,sans-serif; margin-bottom:6px; }}
.bars {{ display:flex; align-items:flex-end; justify-content:space-around; height:{chart_area}px; }}
.bar-col {{ display:flex; flex-direction:column; align-items:center; justify-content:flex-end; height:100%; }}
.bar {{ width:42px; border-radius:5px 5px 0 0; }}
.bar-count {{ font-size:{font_size}px; color:#555; font-family:"Helvetica Neue",Arial,sans-serif; }}
.bar-label {{ font-size:{font_size}px; color:#333; margin-top:4px; font-family:"Helvetica Neue",Arial,sans-serif; }}
.refresh-note {{ text-align:center; color:#2e7d32; font-size:14px; margin-top:16px; font-family:"Helvetica Neue",Arial,sans-serif; }}
.footer {{ text-align:center; color:#888; font-size:12px; font-family:"Helvetica Neue",Arial,sans-serif; }}
"#,
        page_bg = t.page_bg,
        title_color = t.title_color,
        title_shadow = t.title_shadow,
        card_shadow = t.card_shadow,
        hover_bg = t.hover_bg,
        font_size = FONT_SIZE_PX,
        pad_v = CELL_PADDING_V,
        pad_h = CELL_PADDING_H,
        row_height = ROW_HEIGHT_PX,
        chart_area = CHART_AREA_PX,
    )
}

/// The pivot table: one row per respondent, one column per choice, cells
/// painted with the colors of the matching slots.
fn render_table(spec: &PollSpec, rows: &[PollRow]) -> String {
    let pivot = pivot_rows(spec, rows);

    let mut html = String::from("<table class='compact-table'>");
    html.push_str("<colgroup>");
    html.push_str(&format!("<col style='width:{}px' />", FIRST_COL_WIDTH_PX));
    for _ in spec.choices.iter() {
        html.push_str(&format!("<col style='width:{}px' />", COLUMN_WIDTH_PX));
    }
    html.push_str("</colgroup><thead><tr>");
    html.push_str("<th>Respondent</th>");
    for choice in spec.choices.iter() {
        html.push_str(&format!("<th>{}</th>", escape(choice)));
    }
    html.push_str("</tr></thead><tbody>");

    for row in pivot.iter() {
        html.push_str("<tr>");
        html.push_str(&format!("<td>{}</td>", escape(&row.respondent)));
        for slots in row.matches.iter() {
            match slots.as_slice() {
                [] => html.push_str("<td></td>"),
                [single] => {
                    let hex = &spec.slots[*single].hex;
                    html.push_str(&format!(
                        "<td style='background: {}; height:{}px;'></td>",
                        hex, ROW_HEIGHT_PX
                    ));
                }
                multiple => {
                    let gradient = multiple
                        .iter()
                        .map(|&ix| spec.slots[ix].hex.clone())
                        .collect::<Vec<String>>()
                        .join(", ");
                    html.push_str(&format!(
                        "<td style='background: linear-gradient(90deg, {}); height:{}px;'></td>",
                        gradient, ROW_HEIGHT_PX
                    ));
                }
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// One bar chart per choice: the count of respondents who picked the choice
/// in each slot, with headroom above the tallest bar.
fn render_charts(spec: &PollSpec, rows: &[PollRow]) -> String {
    let mut html = String::from("<div class='charts-grid'>");
    for (choice_ix, choice) in spec.choices.iter().enumerate() {
        let counts = slot_counts(spec, rows, choice_ix);
        let max = counts.iter().cloned().max().unwrap_or(0);
        html.push_str("<div class='chart'>");
        html.push_str(&format!("<div class='chart-title'>{}</div>", escape(choice)));
        html.push_str("<div class='bars'>");
        for (slot_ix, slot) in spec.slots.iter().enumerate() {
            let count = counts[slot_ix];
            let height = if max == 0 {
                0
            } else {
                (count as f64 / (max as f64 * 1.25) * CHART_AREA_PX as f64).round() as u32
            };
            html.push_str("<div class='bar-col'>");
            html.push_str(&format!("<div class='bar-count'>{}</div>", count));
            html.push_str(&format!(
                "<div class='bar' style='height:{}px;background:{};'></div>",
                height, slot.hex
            ));
            html.push_str(&format!("<div class='bar-label'>{}</div>", escape(&slot.name)));
            html.push_str("</div>");
        }
        html.push_str("</div></div>");
    }
    html.push_str("</div>");
    html
}

pub fn render_page(spec: &PollSpec, rows: &[PollRow], refresh_secs: u32) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh}">
<title>{title}</title>
<style>
{css}
</style>
</head>
<body>
<h1 class="header-title">{title}</h1>
<p class="sub-text">{subtitle}</p>
<div class="layout">
<div class="card card-results">
<p>🧾 Answers so far</p>
{table}
</div>
<div class="card card-charts">
<p>📊 Guesses per cup</p>
{charts}
</div>
</div>
<p class="refresh-note">🌟 This page reloads every {refresh} seconds 🌟</p>
<p class="footer">{footer}</p>
</body>
</html>
"#,
        refresh = refresh_secs,
        title = escape(&spec.title),
        subtitle = escape(&spec.subtitle),
        css = page_css(spec),
        table = render_table(spec, rows),
        charts = render_charts(spec, rows),
        footer = escape(&spec.footer),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::poll_preset;

    fn row(respondent: &str, key: u64, picks: &[&str]) -> PollRow {
        PollRow {
            respondent: respondent.to_string(),
            sort_key: key,
            picks: picks.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn page_carries_the_refresh_tag() {
        let spec = poll_preset("sport").unwrap();
        let page = render_page(&spec, &[], 3);
        assert!(page.contains(r#"<meta http-equiv="refresh" content="3">"#));
        assert!(page.contains("Blind Sports-Drink Tasting"));
    }

    #[test]
    fn single_match_paints_a_plain_cell() {
        let spec = poll_preset("sport").unwrap();
        let rows = vec![row(
            "Team 1",
            1,
            &["Pocari Sweat", "Aquarius", "Dakara", "Love Sports"],
        )];
        let table = render_table(&spec, &rows);
        assert!(table.contains("background: #fc81ac"));
        assert!(!table.contains("linear-gradient"));
    }

    #[test]
    fn double_match_paints_a_gradient() {
        let spec = poll_preset("sport").unwrap();
        // Pocari picked for both pink and blue.
        let rows = vec![row(
            "Team 1",
            1,
            &["Pocari Sweat", "Pocari Sweat", "Dakara", "Love Sports"],
        )];
        let table = render_table(&spec, &rows);
        assert!(table.contains("linear-gradient(90deg, #fc81ac, #5ddaf0)"));
    }

    #[test]
    fn bars_scale_to_the_maximum() {
        let spec = poll_preset("sport").unwrap();
        let rows = vec![
            row("Team 1", 1, &["Pocari Sweat", "Aquarius", "Dakara", "Love Sports"]),
            row("Team 2", 2, &["Pocari Sweat", "Dakara", "Aquarius", "Love Sports"]),
        ];
        let charts = render_charts(&spec, &rows);
        // max=2 for Pocari in pink: height = 2 / 2.5 * 200 = 160.
        assert!(charts.contains("height:160px;background:#fc81ac"));
    }

    #[test]
    fn respondent_names_are_escaped() {
        let spec = poll_preset("tea").unwrap();
        let rows = vec![row("Team <1>", 1, &["", "", "", ""])];
        let table = render_table(&spec, &rows);
        assert!(table.contains("Team &lt;1&gt;"));
    }
}
