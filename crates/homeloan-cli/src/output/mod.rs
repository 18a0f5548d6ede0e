pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Result fields holding one row per bank or property.
const ROW_FIELDS: [&str; 3] = ["options", "properties", "consultations"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The row array inside a result, if it has one.
fn row_field(result: &Map<String, Value>) -> Option<(&'static str, &[Value])> {
    ROW_FIELDS.iter().find_map(|key| match result.get(*key) {
        Some(Value::Array(rows)) => Some((*key, rows.as_slice())),
        _ => None,
    })
}

/// Flatten nested objects one level deep (`financing.monthly_emi`).
fn flatten_row(row: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    for (key, val) in row {
        match val {
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    flat.insert(format!("{key}.{inner_key}"), inner_val.clone());
                }
            }
            _ => {
                flat.insert(key.clone(), val.clone());
            }
        }
    }
    flat
}
