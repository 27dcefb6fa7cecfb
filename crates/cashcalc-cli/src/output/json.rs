use serde_json::Value;

/// Pretty-print the full result envelope as JSON to stdout. This is the
/// default format and the one the sharing/persistence collaborators store.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}
