//! Chat input tokenizer.
//!
//! Whitespace separates tokens; a double-quoted segment is one token. The
//! outermost pair of quotes in a token is removed, wherever it sits.

use std::sync::LazyLock;

use regex::Regex;

/// Quoted segment or run of non-whitespace.
#[allow(clippy::expect_used)]
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]+"|[^\s]+"#).expect("static regex is valid"));

/// First quote through last quote, with something in between.
#[allow(clippy::expect_used)]
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(.+)""#).expect("static regex is valid"));

/// Split `input` into tokens, honouring double quotes.
pub fn tokenize(input: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(input.trim())
        .map(|m| QUOTED_RE.replace(m.as_str(), "$1").into_owned())
        .collect()
}
