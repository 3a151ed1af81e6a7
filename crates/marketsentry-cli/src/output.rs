use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::metadata::Envelope;

pub fn render(envelope: &Envelope, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }

    Ok(())
}

/// Lays out list data as aligned columns and anything else as `key: value`.
pub fn render_table(envelope: &Envelope) -> Result<String, CliError> {
    let mut out = String::new();

    match &envelope.data {
        Value::Array(rows) => {
            let columns = if envelope.columns.is_empty() {
                inferred_columns(rows)
            } else {
                envelope.columns.to_vec()
            };
            out.push_str(&columns_table(&columns, rows));
        }
        Value::Object(fields) => {
            let width = fields.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in fields {
                out.push_str(&format!("{key:<width$}  {}\n", cell(value)));
            }
        }
        Value::Null => out.push_str("ok\n"),
        other => {
            out.push_str(&serde_json::to_string(other)?);
            out.push('\n');
        }
    }

    if let Some(pagination) = &envelope.meta.pagination {
        out.push_str(&format!(
            "\npage {}/{}  [{}prev] [{}next]\n",
            pagination.current_page,
            pagination.total_pages.max(1),
            if pagination.has_previous { "" } else { "no " },
            if pagination.has_next { "" } else { "no " },
        ));
    }

    for warning in &envelope.meta.warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }

    Ok(out)
}

fn inferred_columns(rows: &[Value]) -> Vec<&str> {
    match rows.first() {
        Some(Value::Object(fields)) => fields.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    }
}

fn columns_table(columns: &[&str], rows: &[Value]) -> String {
    if rows.is_empty() {
        return String::from("(no results)\n");
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column.to_ascii_uppercase()))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    for row in cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
