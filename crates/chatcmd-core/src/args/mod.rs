//! Argument type grammar.
//!
//! Every node in a command tree owns one [`ArgumentType`] that decides
//! whether a raw token fits and, if so, what value it converts to. The
//! matcher and the value-extraction pass both go through
//! [`ArgumentType::matches`], so a token can never validate one way and
//! convert another.

mod location;

use std::borrow::Cow;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use location::{Coordinate, resolve_location};

use crate::sender::{PlayerDirectory, SenderRef, Vec3};
use crate::tree::CommandRegistry;

/// Names ending with this marker are synthetic continuation nodes.
pub const TRAILING_MARKER: char = '*';

/// What a matcher may consult while testing a token.
#[derive(Clone, Copy)]
pub struct MatchEnv<'a> {
    pub registry: &'a CommandRegistry,
    pub players: &'a dyn PlayerDirectory,
}

/// Extension point for host-defined argument types.
pub trait CustomArgument: Send + Sync {
    /// Diagnostic discriminator, e.g. `"CommandName"`.
    fn type_name(&self) -> &str;

    /// Kind of the value produced on success.
    fn value_kind(&self) -> ValueKind;

    /// Test and convert a token. Must be pure and must not panic.
    fn matches(&self, token: &str, env: &MatchEnv<'_>) -> Option<ArgValue>;

    /// Rejection text shown when this was the only candidate.
    fn fail(&self, token: &str) -> String;
}

/// Schema discriminant of a converted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Integer,
    Boolean,
    Player,
    Location,
    Json,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Player => "player",
            Self::Location => "location",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// A converted argument value.
#[derive(Clone)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Player(SenderRef),
    /// One axis of a location, before resolution.
    Coordinate(Coordinate),
    /// A resolved location triple.
    Location(Vec3),
    Json(serde_json::Value),
}

impl ArgValue {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) => ValueKind::Integer,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Player(_) => ValueKind::Player,
            Self::Coordinate(_) | Self::Location(_) => ValueKind::Location,
            Self::Json(_) => ValueKind::Json,
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Self::Player(p) => f.debug_tuple("Player").field(&p.name()).finish(),
            Self::Coordinate(c) => f.debug_tuple("Coordinate").field(c).finish(),
            Self::Location(v) => f.debug_tuple("Location").field(v).finish(),
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Player(a), Self::Player(b)) => Arc::ptr_eq(a, b),
            (Self::Coordinate(a), Self::Coordinate(b)) => a == b,
            (Self::Location(a), Self::Location(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            _ => false,
        }
    }
}

/// The grammar of a single tree node.
#[derive(Clone)]
pub enum ArgumentType {
    Literal {
        name: String,
    },
    String {
        name: String,
    },
    Integer {
        name: String,
        range: Option<RangeInclusive<i64>>,
    },
    Boolean {
        name: String,
    },
    Array {
        name: String,
        options: Vec<String>,
    },
    Player {
        name: String,
    },
    /// One coordinate axis; three chained nodes form a location.
    Location {
        name: String,
    },
    Custom {
        name: String,
        parser: Arc<dyn CustomArgument>,
    },
}

impl ArgumentType {
    pub fn literal(name: impl Into<String>) -> Self {
        Self::Literal { name: name.into() }
    }

    pub fn custom(name: impl Into<String>, parser: impl CustomArgument + 'static) -> Self {
        Self::Custom {
            name: name.into(),
            parser: Arc::new(parser),
        }
    }

    /// Display name of the argument.
    pub fn name(&self) -> &str {
        match self {
            Self::Literal { name }
            | Self::String { name }
            | Self::Integer { name, .. }
            | Self::Boolean { name }
            | Self::Array { name, .. }
            | Self::Player { name }
            | Self::Location { name }
            | Self::Custom { name, .. } => name,
        }
    }

    /// Stable discriminator shown in diagnostics and usage text.
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Self::Literal { .. } => Cow::Borrowed("literal"),
            Self::String { .. } => Cow::Borrowed("string"),
            Self::Integer { .. } => Cow::Borrowed("int"),
            Self::Boolean { .. } => Cow::Borrowed("boolean"),
            Self::Array { options, .. } => Cow::Owned(options.join("|")),
            Self::Player { .. } => Cow::Borrowed("player"),
            Self::Location { .. } => Cow::Borrowed("location"),
            Self::Custom { parser, .. } => Cow::Borrowed(parser.type_name()),
        }
    }

    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    pub const fn is_location(&self) -> bool {
        matches!(self, Self::Location { .. })
    }

    /// Synthetic continuation node, hidden from usage and value lists.
    pub fn is_trailing(&self) -> bool {
        self.name().ends_with(TRAILING_MARKER)
    }

    /// Kind of value this node contributes, `None` for nodes that contribute nothing.
    pub fn value_kind(&self) -> Option<ValueKind> {
        if self.is_trailing() {
            return None;
        }
        match self {
            Self::Literal { .. } => None,
            Self::String { .. } | Self::Array { .. } => Some(ValueKind::Text),
            Self::Integer { .. } => Some(ValueKind::Integer),
            Self::Boolean { .. } => Some(ValueKind::Boolean),
            Self::Player { .. } => Some(ValueKind::Player),
            Self::Location { .. } => Some(ValueKind::Location),
            Self::Custom { parser, .. } => Some(parser.value_kind()),
        }
    }

    /// Test `token` and convert it. `None` is an ordinary rejection.
    pub fn matches(&self, token: &str, env: &MatchEnv<'_>) -> Option<ArgValue> {
        match self {
            Self::Literal { name } => (token == name).then(|| ArgValue::Text(name.clone())),
            Self::String { .. } => Some(ArgValue::Text(token.to_string())),
            Self::Integer { range, .. } => {
                let value = token.parse::<i64>().ok()?;
                match range {
                    Some(range) if !range.contains(&value) => None,
                    _ => Some(ArgValue::Integer(value)),
                }
            }
            Self::Boolean { .. } => match token {
                "true" => Some(ArgValue::Boolean(true)),
                "false" => Some(ArgValue::Boolean(false)),
                _ => None,
            },
            Self::Array { options, .. } => options
                .iter()
                .find(|option| option.as_str() == token)
                .map(|option| ArgValue::Text(option.clone())),
            Self::Player { .. } => env.players.find_player(token).map(ArgValue::Player),
            Self::Location { .. } => Coordinate::parse(token).map(ArgValue::Coordinate),
            Self::Custom { parser, .. } => parser.matches(token, env),
        }
    }

    /// Human-readable rejection of `token`.
    pub fn fail(&self, token: &str) -> String {
        match self {
            Self::Literal { name } => format!("\"{token}\" should be \"{name}\""),
            Self::String { name } => format!("\"{token}\" is not a valid string for \"{name}\""),
            Self::Integer {
                range: Some(range), ..
            } => format!(
                "\"{token}\" should be an integer between {} and {}",
                range.start(),
                range.end()
            ),
            Self::Integer { range: None, .. } => format!("\"{token}\" should be an integer"),
            Self::Boolean { .. } => format!("\"{token}\" should be true or false"),
            Self::Array { options, .. } => {
                format!("\"{token}\" should be one of: {}", options.join(", "))
            }
            Self::Player { .. } => format!("Player \"{token}\" could not be found"),
            Self::Location { .. } => format!("\"{token}\" is not a valid coordinate"),
            Self::Custom { parser, .. } => parser.fail(token),
        }
    }
}

impl fmt::Debug for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.name(), self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::NoPlayers;

    fn int(range: Option<RangeInclusive<i64>>) -> ArgumentType {
        ArgumentType::Integer {
            name: "n".into(),
            range,
        }
    }

    fn check(kind: &ArgumentType, token: &str) -> Option<ArgValue> {
        let registry = CommandRegistry::new();
        let env = MatchEnv {
            registry: &registry,
            players: &NoPlayers,
        };
        kind.matches(token, &env)
    }

    #[test]
    fn ranged_integer_accepts_inside() {
        assert_eq!(check(&int(Some(1..=10)), "5"), Some(ArgValue::Integer(5)));
        assert_eq!(check(&int(Some(1..=10)), "10"), Some(ArgValue::Integer(10)));
    }

    #[test]
    fn ranged_integer_rejects_outside() {
        assert_eq!(check(&int(Some(1..=10)), "0"), None);
        assert_eq!(check(&int(Some(1..=10)), "11"), None);
    }

    #[test]
    fn integer_rejects_non_numeric() {
        assert_eq!(check(&int(Some(1..=10)), "abc"), None);
        assert_eq!(check(&int(None), "abc"), None);
        assert_eq!(check(&int(None), "1.5"), None);
        assert_eq!(check(&int(None), "-3"), Some(ArgValue::Integer(-3)));
    }

    #[test]
    fn boolean_is_case_sensitive() {
        let b = ArgumentType::Boolean { name: "b".into() };
        assert_eq!(check(&b, "true"), Some(ArgValue::Boolean(true)));
        assert_eq!(check(&b, "false"), Some(ArgValue::Boolean(false)));
        assert_eq!(check(&b, "True"), None);
    }

    #[test]
    fn array_requires_exact_option() {
        let a = ArgumentType::Array {
            name: "mode".into(),
            options: vec!["survival".into(), "creative".into()],
        };
        assert_eq!(check(&a, "creative"), Some(ArgValue::Text("creative".into())));
        assert_eq!(check(&a, "Creative"), None);
        assert_eq!(a.type_name(), "survival|creative");
    }

    #[test]
    fn literal_matches_only_keyword() {
        let l = ArgumentType::literal("facing");
        assert!(check(&l, "facing").is_some());
        assert!(check(&l, "face").is_none());
        assert!(l.is_literal());
        assert_eq!(l.value_kind(), None);
    }

    #[test]
    fn player_fails_when_offline() {
        let p = ArgumentType::Player { name: "target".into() };
        assert!(check(&p, "Steve").is_none());
        assert_eq!(p.fail("Steve"), "Player \"Steve\" could not be found");
    }

    #[test]
    fn trailing_marker_contributes_no_value() {
        let axis = ArgumentType::Location { name: "pos_y*".into() };
        assert!(axis.is_trailing());
        assert_eq!(axis.value_kind(), None);
        assert!(check(&axis, "~2").is_some());
    }

    #[test]
    fn ranged_integer_fail_mentions_bounds() {
        assert_eq!(
            int(Some(1..=10)).fail("0"),
            "\"0\" should be an integer between 1 and 10"
        );
    }
}
