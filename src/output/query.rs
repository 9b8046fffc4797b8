//! Tab-separated rendering of ad-hoc query results

use crate::storage::QueryResult;

/// Renders a header line followed by one line per row, fields tab-separated
pub fn format_query_result(result: &QueryResult) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);
    lines.push(result.columns.join("\t"));
    lines.extend(result.rows.iter().map(|row| row.join("\t")));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn print_query_result(result: &QueryResult) {
    print!("{}", format_query_result(result));
}
