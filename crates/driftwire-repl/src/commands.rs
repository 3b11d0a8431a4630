//! Command parsing for the REPL.
//!
//! This module parses input lines into structured [`Command`] values.

use serde_json::Value;

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Invoke a remote method.
    Call {
        /// Method name.
        method: String,
        /// Call arguments; empty when none were supplied.
        params: Vec<Value>,
    },

    /// Subscribe to a remote dataset.
    Sub {
        /// Subscription name.
        name: String,
        /// Subscription arguments; empty when none were supplied.
        params: Vec<Value>,
    },

    /// Show usage help.
    Help,

    /// Quit the session.
    Quit,

    /// Blank input; ignored.
    Empty,

    /// Unknown command word.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse one input line into a command.
///
/// Requests take a name followed by an optional JSON array of
/// parameters: `call createApp [{"name": "foo"}]` or `sub allApps`.
pub fn parse(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() {
        return Command::Empty;
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match head {
        "call" => match parse_name_and_params(rest) {
            Ok((method, params)) => Command::Call { method, params },
            Err(error) => Command::InvalidArgs { command: "call".into(), error },
        },

        "sub" => match parse_name_and_params(rest) {
            Ok((name, params)) => Command::Sub { name, params },
            Err(error) => Command::InvalidArgs { command: "sub".into(), error },
        },

        "help" => Command::Help,

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}

/// Split a request body into its name and optional JSON parameter array.
fn parse_name_and_params(rest: &str) -> Result<(String, Vec<Value>), String> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    if name.is_empty() {
        return Err("usage: <name> [<json array of parameters>]".to_string());
    }

    let params = match parts.next().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str::<Vec<Value>>(json)
            .map_err(|error| format!("parameters must be a JSON array: {error}"))?,
    };

    Ok((name.to_string(), params))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_call_without_params() {
        assert_eq!(
            parse("call vote"),
            Command::Call { method: "vote".into(), params: Vec::new() }
        );
    }

    #[test]
    fn parse_call_with_params() {
        assert_eq!(
            parse(r#"call createApp [{"name": "foo.meteor.com", "description": "bar"}]"#),
            Command::Call {
                method: "createApp".into(),
                params: vec![json!({"name": "foo.meteor.com", "description": "bar"})],
            }
        );
    }

    #[test]
    fn parse_call_missing_name() {
        assert!(
            matches!(parse("call"), Command::InvalidArgs { command, .. } if command == "call")
        );
    }

    #[test]
    fn parse_call_with_non_array_params() {
        assert!(matches!(
            parse(r#"call vote {"not": "an array"}"#),
            Command::InvalidArgs { command, .. } if command == "call"
        ));
    }

    #[test]
    fn parse_sub_without_params() {
        assert_eq!(parse("sub allApps"), Command::Sub { name: "allApps".into(), params: vec![] });
    }

    #[test]
    fn parse_sub_with_params() {
        assert_eq!(
            parse(r#"sub myApp ["foo.meteor.com"]"#),
            Command::Sub { name: "myApp".into(), params: vec![json!("foo.meteor.com")] }
        );
    }

    #[test]
    fn parse_help() {
        assert_eq!(parse("help"), Command::Help);
    }

    #[test]
    fn parse_quit() {
        assert_eq!(parse("quit"), Command::Quit);
        assert_eq!(parse("q"), Command::Quit);
    }

    #[test]
    fn parse_empty() {
        assert_eq!(parse(""), Command::Empty);
        assert_eq!(parse("   "), Command::Empty);
    }

    #[test]
    fn parse_unknown_command() {
        assert!(matches!(parse("frobnicate"), Command::Unknown { .. }));
    }
}
