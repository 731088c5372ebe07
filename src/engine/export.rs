use super::column::ColumnDefinition;
use super::record::Record;
use super::value::Value;

/// Render rows as CSV: a header line of column labels, then one line per row.
pub fn export_csv(rows: &[&Record], columns: &[ColumnDefinition]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| wrap_cell_content(&c.label))
            .collect::<Vec<String>>()
            .join(","),
    );
    for row in rows {
        let content = columns
            .iter()
            .map(|c| match c.value(row) {
                Value::Null => String::new(),
                v => wrap_cell_content(&v.to_string()),
            })
            .collect::<Vec<String>>();
        lines.push(content.join(","));
    }
    lines.join("\n")
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = needs_escaping || c.chars().any(|c| matches!(c, ' ' | '\t' | ',' | '\n'));

    let mut out = c.to_string();
    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}
