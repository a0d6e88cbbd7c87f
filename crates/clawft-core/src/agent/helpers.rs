//! Template rendering helpers for agent prompts.
//!
//! Provides variable substitution for agent system prompts and skill
//! instructions.  The template syntax is intentionally simple and does
//! not depend on a full template engine:
//!
//! | Syntax        | Replaced with                                     |
//! |---------------|---------------------------------------------------|
//! | `$ARGUMENTS`  | The full argument string passed to the agent       |
//! | `${1}`, `${2}`| Positional arguments (1-based, space-separated)   |
//! | `${NAME}`     | Named variable from `AgentDefinition.variables`   |
//!
//! Missing positional or named variables are replaced with an empty
//! string -- no error is raised.

use std::collections::HashMap;

/// Render template variables in a string.
///
/// Performs three substitution passes in order:
/// 1. `$ARGUMENTS` is replaced with the full `args` string.
/// 2. `${N}` (where N is a positive integer) is replaced with the
///    Nth positional argument (1-based).  Arguments are split on
///    whitespace.
/// 3. `${NAME}` (where NAME is not a number) is replaced with the
///    matching entry from `variables`.
///
/// Unknown variables and out-of-range positional references are
/// replaced with an empty string.
///
/// # Examples
///
/// ```rust,ignore
/// use std::collections::HashMap;
/// let vars = HashMap::from([("lang".to_string(), "Rust".to_string())]);
/// let result = render_template("Hello ${1}, using ${lang}!", "world", &vars);
/// assert_eq!(result, "Hello world, using Rust!");
/// ```
pub fn render_template(template: &str, args: &str, variables: &HashMap<String, String>) -> String {
    // Pass 1: replace $ARGUMENTS
    let result = template.replace("$ARGUMENTS", args);

    // Pre-split positional args for pass 2
    let positional: Vec<&str> = if args.is_empty() {
        Vec::new()
    } else {
        args.split_whitespace().collect()
    };

    // Pass 2 + 3: replace ${...} references
    let mut output = String::with_capacity(result.len());
    let mut chars = result.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            // Consume '{'
            chars.next();

            // Read until '}' or end of string
            let mut var_name = String::new();
            let mut found_close = false;
            for inner in chars.by_ref() {
                if inner == '}' {
                    found_close = true;
                    break;
                }
                var_name.push(inner);
            }

            if !found_close {
                // Malformed -- emit as-is
                output.push('$');
                output.push('{');
                output.push_str(&var_name);
            } else if let Ok(idx) = var_name.parse::<usize>() {
                // Positional argument (1-based)
                if idx >= 1 && idx <= positional.len() {
                    output.push_str(positional[idx - 1]);
                }
                // else: out of range -> empty string
            } else {
                // Named variable
                if let Some(val) = variables.get(&var_name) {
                    output.push_str(val);
                }
                // else: missing -> empty string
            }
        } else {
            output.push(ch);
        }
    }

    output
}
