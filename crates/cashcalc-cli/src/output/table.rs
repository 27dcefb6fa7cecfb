use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// The result envelope's scalar fields become one Field/Value table; nested
/// objects (bonus details, per-month and per-city arrays) get their own
/// sections so a monthly schedule reads like a schedule and not like JSON.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_section(result);
                print_warnings(map);
                if let Some(Value::String(meth)) = map.get("methodology") {
                    println!("\nMethodology: {}", meth);
                }
            } else {
                print_scalar_table(value, None);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_section(result: &Value) {
    match result {
        Value::Object(map) => {
            print_scalar_table(result, None);

            for (key, val) in map {
                match val {
                    Value::Object(_) => print_scalar_table(val, Some(key)),
                    Value::Array(arr) if arr.iter().all(Value::is_object) && !arr.is_empty() => {
                        println!("\n{}:", key);
                        print_array_table(arr);
                    }
                    _ => {}
                }
            }
        }
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", other),
    }
}

/// One Field/Value table of the scalar fields of an object.
fn print_scalar_table(value: &Value, title: Option<&str>) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        let mut rows = 0;
        for (key, val) in map {
            if val.is_object() || val.is_array() {
                continue;
            }
            builder.push_record([key.as_str(), &format_value(val)]);
            rows += 1;
        }
        if rows == 0 {
            return;
        }
        if let Some(t) = title {
            println!("\n{}:", t);
        }
        println!("{}", Table::from(builder));
    }
}

/// An array of objects as one table, scalar columns only.
fn print_array_table(arr: &[Value]) {
    let first = match arr.first() {
        Some(Value::Object(map)) => map,
        _ => {
            for item in arr {
                println!("{}", item);
            }
            return;
        }
    };

    let headers: Vec<&str> = first
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .map(|(k, _)| k.as_str())
        .collect();

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_warnings(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
