use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Spreadsheet exports routinely carry a UTF-8 BOM glued to the first header
/// cell.
pub fn strip_bom(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}')
}
