//! "Did you mean" candidates for unknown command names.

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::sender::CommandSender;
use crate::tree::CommandRegistry;

/// How many alternatives a not-found message offers.
pub const MAX_SUGGESTIONS: usize = 3;

/// A single fuzzy match result.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub text: String,
    pub score: u32,
}

/// Performs fzf-style fuzzy matching of `query` against `items`.
///
/// Returns up to `max_results` results sorted by score (highest first,
/// ties keep input order).
pub fn fuzzy_match(query: &str, items: &[&str], max_results: usize) -> Vec<MatchResult> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let atom = Atom::new(
        query,
        CaseMatching::Ignore,
        Normalization::Smart,
        AtomKind::Fuzzy,
        false,
    );

    let mut buf = Vec::new();
    let mut results: Vec<MatchResult> = items
        .iter()
        .filter_map(|item| {
            let haystack = Utf32Str::new(item, &mut buf);
            let score = atom.score(haystack, &mut matcher)?;
            Some(MatchResult {
                text: (*item).to_string(),
                score: u32::from(score),
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(max_results);
    results
}

/// Root names (not aliases) the sender may use that resemble `name`.
pub fn similar_commands(
    registry: &CommandRegistry,
    sender: &dyn CommandSender,
    name: &str,
) -> Vec<String> {
    let names: Vec<&str> = registry
        .roots()
        .map(|id| registry.node(id).data())
        .filter(|data| data.permits(sender))
        .map(|data| data.name.as_str())
        .collect();
    fuzzy_match(name, &names, MAX_SUGGESTIONS)
        .into_iter()
        .map(|m| m.text)
        .collect()
}
