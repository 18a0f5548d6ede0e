use serde_json::Value;

/// Where the headline figure lives for each command's result, in priority order.
const HEADLINE_POINTERS: [&str; 12] = [
    "/emi",
    "/recommendation/recommended_loan_amount",
    "/max_loan_amount",
    "/recommendations/best_emi/bank_name",
    "/financing_summary/recommended_property",
    "/summary/total_found",
    "/status",
    "/triage/priority",
    "/priority",
    "/change/new_status",
    "/summary/total",
    "/total_applications",
];

/// Print just the key answer value from the output, falling back to the
/// first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if result_obj.is_object() {
        for pointer in HEADLINE_POINTERS {
            if let Some(val) = result_obj.pointer(pointer) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = result_obj.as_object().and_then(|m| m.iter().next()) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
