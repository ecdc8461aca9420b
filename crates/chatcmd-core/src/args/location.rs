//! Single-axis coordinate parsing.
//!
//! A location argument is three chained axis nodes. Each axis parses to a
//! [`Coordinate`]; relative forms are only resolved once the dispatcher
//! knows where the sender is standing.

use crate::sender::Vec3;

/// One parsed axis component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    /// `7`
    Absolute(f64),
    /// `~5`, offset from the sender position.
    Relative(f64),
    /// `^2`, offset from the sender view direction.
    Local(f64),
}

impl Coordinate {
    /// Parse a bare number, `~offset`, or `^offset`. A lone `~`/`^` is offset 0.
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(rest) = token.strip_prefix('~') {
            return parse_offset(rest).map(Self::Relative);
        }
        if let Some(rest) = token.strip_prefix('^') {
            return parse_offset(rest).map(Self::Local);
        }
        parse_number(token).map(Self::Absolute)
    }

    /// Resolve against the sender's current axis position and view component.
    pub fn resolve(self, position: f64, view: f64) -> f64 {
        match self {
            Self::Absolute(v) => v,
            Self::Relative(delta) => position + delta,
            Self::Local(delta) => view + delta,
        }
    }
}

/// Combine three axis components into a point for a sender at `position`
/// looking along `view`.
pub fn resolve_location(axes: [Coordinate; 3], position: Vec3, view: Vec3) -> Vec3 {
    let [x, y, z] = axes;
    Vec3::new(
        x.resolve(position.x, view.x),
        y.resolve(position.y, view.y),
        z.resolve(position.z, view.z),
    )
}

fn parse_offset(rest: &str) -> Option<f64> {
    if rest.is_empty() {
        return Some(0.0);
    }
    parse_number(rest)
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn relative_axis_adds_to_position() {
        let c = Coordinate::parse("~5").unwrap();
        assert_eq!(c, Coordinate::Relative(5.0));
        assert!((c.resolve(10.0, 0.3) - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn local_axis_adds_to_view_component() {
        let c = Coordinate::parse("^2").unwrap();
        assert!((c.resolve(10.0, 1.0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn absolute_axis_is_unmodified() {
        let c = Coordinate::parse("7").unwrap();
        assert!((c.resolve(10.0, 1.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bare_tilde_is_zero_offset() {
        assert_eq!(Coordinate::parse("~"), Some(Coordinate::Relative(0.0)));
        assert_eq!(Coordinate::parse("^"), Some(Coordinate::Local(0.0)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Coordinate::parse("abc"), None);
        assert_eq!(Coordinate::parse("~x"), None);
        assert_eq!(Coordinate::parse(""), None);
        assert_eq!(Coordinate::parse("NaN"), None);
    }

    #[test]
    fn resolves_full_location() {
        let axes = [
            Coordinate::parse("~1").unwrap(),
            Coordinate::parse("3").unwrap(),
            Coordinate::parse("^7").unwrap(),
        ];
        let loc = resolve_location(axes, Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(loc, Vec3::new(2.0, 3.0, 8.0));
    }
}
