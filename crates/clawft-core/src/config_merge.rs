//! JSON deep merge and key normalization utilities.
//!
//! Used by the workspace config loader to merge defaults, global config,
//! and workspace-level config into a single resolved [`Config`].

use serde_json::Value;

/// Deep merge two JSON [`Value`]s.
///
/// Rules (per consensus P1 #21):
/// - **Objects** are recursively merged (right keys override left).
/// - **Arrays** are REPLACED (not concatenated).
/// - **Scalars**: right overrides left.
/// - **Null** on right deletes the key from the base.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(key);
                } else if let Some(base_value) = base_map.get_mut(key) {
                    deep_merge(base_value, value);
                } else {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Recursively normalize JSON object keys from `camelCase` to `snake_case`.
///
/// For example, `"mcpServers"` becomes `"mcp_servers"`, `"maxTokens"` becomes
/// `"max_tokens"`. Non-object values and already-snake_case keys pass through
/// unchanged.
pub fn normalize_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            // Collect keys that need renaming to avoid borrow issues.
            let entries: Vec<(String, Value)> = map
                .iter()
                .map(|(k, v)| (camel_to_snake(k), v.clone()))
                .collect();

            map.clear();
            for (key, mut val) in entries {
                normalize_keys(&mut val);
                map.insert(key, val);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                normalize_keys(item);
            }
        }
        _ => {}
    }
}

/// Convert a single `camelCase` string to `snake_case`.
///
/// Handles consecutive uppercase letters (e.g. `"HTMLParser"` -> `"html_parser"`).
fn camel_to_snake(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            // Insert underscore before uppercase letter if:
            // - Not the first character, AND
            // - Previous character is lowercase, OR
            // - Next character exists and is lowercase (handles "HTMLParser" -> "html_parser")
            if i > 0 {
                let prev_lower = chars[i - 1].is_lowercase();
                let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
                if prev_lower || next_lower {
                    result.push('_');
                }
            }
            result.push(ch.to_lowercase().next().unwrap());
        } else {
            result.push(ch);
        }
    }

    result
}
