//! Extraction of numbered, labelled values from freeform AI output.
//!
//! Assistants are asked to answer with lines such as `OPTION_1: feat: add login`,
//! but routinely decorate them (`**OPTION_1:** feat: add login`, backticks,
//! surrounding prose). The scanner here tolerates that noise and reports
//! failure through [`ParseResult`] rather than an error type.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_PREFIX: &str = "OPTION";
pub const NO_OPTIONS_ERROR: &str = "No valid options found in AI output";

// ---------------------------------------------------------------------------
// ParseResult
// ---------------------------------------------------------------------------

/// Outcome of a parse over AI output.
///
/// `success` is true exactly when `values` is non-empty; `error` is set
/// exactly when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ParseResult<T> {
    /// Build a result from extracted values, failing with `error` when
    /// there are none.
    pub fn from_values(values: Vec<T>, error: impl Into<String>) -> Self {
        if values.is_empty() {
            Self::failure(error)
        } else {
            Self {
                success: true,
                values,
                error: None,
            }
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            values: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ParseResult<U> {
        ParseResult {
            success: self.success,
            values: self.values.into_iter().map(f).collect(),
            error: self.error,
        }
    }

    /// Convert into a std `Result`, for callers that want `?`.
    pub fn into_result(self) -> std::result::Result<Vec<T>, String> {
        if self.success {
            Ok(self.values)
        } else {
            Err(self.error.unwrap_or_else(|| NO_OPTIONS_ERROR.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// ParseOptions
// ---------------------------------------------------------------------------

pub struct ParseOptions<'a> {
    /// Label token before `_<n>:`. Matched case-insensitively.
    pub prefix: &'a str,
    /// Applied to every extracted value; empty results are discarded.
    pub sanitize: Option<&'a dyn Fn(&str) -> String>,
}

impl Default for ParseOptions<'_> {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX,
            sanitize: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Numbered output scanner
// ---------------------------------------------------------------------------

fn numbered_line_regex(prefix: &str) -> Regex {
    let pattern = format!(
        r"(?i)^\s*[*`]*\s*{}_\d+:[*`]*\s*(.*)$",
        regex::escape(prefix)
    );
    Regex::new(&pattern).expect("numbered-line pattern is valid for any escaped prefix")
}

fn default_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| numbered_line_regex(DEFAULT_PREFIX))
}

/// Strip a trailing run of `*` / `` ` `` left over from markdown emphasis.
fn strip_trailing_decoration(value: &str) -> &str {
    value.trim_end().trim_end_matches(['*', '`'])
}

/// Extract every `PREFIX_<n>: value` line from `raw`.
///
/// Values come back in the order the lines appear in the text, not sorted
/// by `<n>`.
pub fn parse_numbered_output(raw: &str, options: &ParseOptions<'_>) -> ParseResult<String> {
    let owned;
    let re = if options.prefix.eq_ignore_ascii_case(DEFAULT_PREFIX) {
        default_regex()
    } else {
        owned = numbered_line_regex(options.prefix);
        &owned
    };

    let values: Vec<String> = raw
        .lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| {
            let value = strip_trailing_decoration(caps.get(1)?.as_str()).trim();
            let value = match options.sanitize {
                Some(f) => f(value),
                None => value.to_string(),
            };
            (!value.is_empty()).then_some(value)
        })
        .collect();

    ParseResult::from_values(values, NO_OPTIONS_ERROR)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParseResult<String> {
        parse_numbered_output(raw, &ParseOptions::default())
    }

    #[test]
    fn plain_options() {
        let r = parse("OPTION_1: feat: a\nOPTION_2: fix: b\nOPTION_3: docs: c");
        assert!(r.success);
        assert_eq!(r.values, ["feat: a", "fix: b", "docs: c"]);
        assert!(r.error.is_none());
    }

    #[test]
    fn tolerates_markdown_and_prose() {
        let raw = "Here are some options:\n\n\
                   **OPTION_1:** feat: add login\n\
                   `OPTION_2: fix: handle null`\n\
                   **OPTION_3: chore: bump deps**\n\
                   Let me know which you prefer.";
        let r = parse(raw);
        assert_eq!(
            r.values,
            ["feat: add login", "fix: handle null", "chore: bump deps"]
        );
    }

    #[test]
    fn prefix_is_case_insensitive() {
        let r = parse("option_1: one\nOption_2: two");
        assert_eq!(r.values, ["one", "two"]);
    }

    #[test]
    fn keeps_line_order_not_numeric_order() {
        let r = parse("OPTION_2: second\nOPTION_1: first");
        assert_eq!(r.values, ["second", "first"]);
    }

    #[test]
    fn no_matches_fails_with_fixed_message() {
        let r = parse("nothing structured here");
        assert!(!r.success);
        assert!(r.values.is_empty());
        assert_eq!(r.error.as_deref(), Some(NO_OPTIONS_ERROR));
    }

    #[test]
    fn empty_values_fail() {
        let r = parse("OPTION_1:   \nOPTION_2: ****");
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some(NO_OPTIONS_ERROR));
    }

    #[test]
    fn empty_values_are_skipped_among_valid_ones() {
        let r = parse("OPTION_1:\nOPTION_2: real");
        assert_eq!(r.values, ["real"]);
    }

    #[test]
    fn sanitize_reducing_everything_to_empty_fails() {
        let blank = |_: &str| String::new();
        let opts = ParseOptions {
            sanitize: Some(&blank),
            ..Default::default()
        };
        let r = parse_numbered_output("OPTION_1: a\nOPTION_2: b", &opts);
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some(NO_OPTIONS_ERROR));
    }

    #[test]
    fn sanitize_applied_per_value() {
        let upper = |s: &str| s.to_uppercase();
        let opts = ParseOptions {
            sanitize: Some(&upper),
            ..Default::default()
        };
        let r = parse_numbered_output("OPTION_1: a", &opts);
        assert_eq!(r.values, ["A"]);
    }

    #[test]
    fn custom_prefix() {
        let opts = ParseOptions {
            prefix: "TITLE",
            sanitize: None,
        };
        let r = parse_numbered_output("OPTION_1: no\nTITLE_1: Add login\nTITLE_12: Fix", &opts);
        assert_eq!(r.values, ["Add login", "Fix"]);
    }

    #[test]
    fn prefix_with_regex_metacharacters_is_literal() {
        let opts = ParseOptions {
            prefix: "A.B",
            sanitize: None,
        };
        assert!(!parse_numbered_output("AxB_1: no", &opts).success);
        assert!(parse_numbered_output("A.B_1: yes", &opts).success);
    }

    #[test]
    fn requires_numeric_suffix() {
        assert!(!parse("OPTION: missing number").success);
        assert!(!parse("OPTION_x: letter").success);
    }

    #[test]
    fn into_result_maps_failure_to_err() {
        assert_eq!(parse("OPTION_1: x").into_result().unwrap(), ["x"]);
        assert_eq!(parse("").into_result().unwrap_err(), NO_OPTIONS_ERROR);
    }

    #[test]
    fn success_iff_values_non_empty() {
        for raw in ["", "OPTION_1: a", "OPTION_1:  ", "x\nOPTION_3: b\nOPTION_9: c"] {
            let r = parse(raw);
            assert_eq!(r.success, !r.values.is_empty(), "{raw:?}");
            assert_eq!(r.error.is_some(), !r.success, "{raw:?}");
        }
    }
}
