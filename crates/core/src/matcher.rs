//! Structural matching combinators.
//!
//! Translation handlers recognize syntax shapes declaratively: a
//! handler destructures its node with ordinary `match`, and delegates
//! the list/arity/optionality/equality legwork to the combinators here.
//! Rules compose top to bottom and commit to the first structural
//! success; a failure is an ordinary [`TranslationError::Syntax`] value
//! carrying what was expected, to which the nearest enclosing statement
//! or expression attaches its span via [`located`].
//!
//! [`does_match`] turns any matcher outcome into a plain predicate for
//! callers that only want recognition, not diagnostics.

use std::fmt;

use crate::ast::Span;
use crate::error::TranslationError;

pub type MatchResult = Result<(), TranslationError>;

/// Matches any node. Placeholder for don't-care positions.
pub fn any<T: ?Sized>(_node: &T) -> MatchResult {
    Ok(())
}

/// Requires equality with an expected atom.
pub fn exact<T>(expected: &T, got: &T) -> MatchResult
where
    T: PartialEq + fmt::Debug + ?Sized,
{
    if expected == got {
        Ok(())
    } else {
        Err(TranslationError::syntax(format!("expected {expected:?}, found {got:?}")))
    }
}

/// Requires an optional clause to be absent.
pub fn absent<T>(node: Option<&T>, what: &str) -> MatchResult {
    match node {
        None => Ok(()),
        Some(_) => Err(TranslationError::syntax(format!("{what} is not allowed here"))),
    }
}

/// Succeeds on absence or on the wrapped match.
pub fn optional<T>(node: Option<&T>, inner: impl FnOnce(&T) -> MatchResult) -> MatchResult {
    match node {
        None => Ok(()),
        Some(node) => inner(node),
    }
}

/// Tries alternatives in order, committing to the first structural
/// success. When none match, the last alternative's failure is
/// reported.
pub fn one_of<T: ?Sized>(node: &T, alternatives: &[&dyn Fn(&T) -> MatchResult]) -> MatchResult {
    let mut failure = TranslationError::syntax("no alternative matched");
    for alternative in alternatives {
        match alternative(node) {
            Ok(()) => return Ok(()),
            Err(err) => failure = err,
        }
    }
    Err(failure)
}

/// Exact-arity list: one matcher per element, applied pairwise.
pub fn fixed<T>(nodes: &[T], matchers: &[&dyn Fn(&T) -> MatchResult]) -> MatchResult {
    if nodes.len() != matchers.len() {
        return Err(TranslationError::syntax(format!(
            "expected {} element(s), found {}",
            matchers.len(),
            nodes.len()
        )));
    }
    for (node, matcher) in nodes.iter().zip(matchers) {
        matcher(node)?;
    }
    Ok(())
}

/// Uniform list matcher; `arity` of `None` leaves the length
/// unconstrained.
pub fn repeat<T>(
    nodes: &[T],
    arity: Option<usize>,
    each: impl Fn(&T) -> MatchResult,
) -> MatchResult {
    if let Some(expected) = arity {
        if nodes.len() != expected {
            return Err(TranslationError::syntax(format!(
                "expected {} element(s), found {}",
                expected,
                nodes.len()
            )));
        }
    }
    for node in nodes {
        each(node)?;
    }
    Ok(())
}

/// Runs the inner pattern, then records the matched node in `slot`.
pub fn capture<'t, T: ?Sized>(
    slot: &mut Option<&'t T>,
    node: &'t T,
    inner: impl FnOnce(&T) -> MatchResult,
) -> MatchResult {
    inner(node)?;
    *slot = Some(node);
    Ok(())
}

/// Runs the inner pattern, then appends the matched node to an
/// order-preserving capture list.
pub fn capture_all<'t, T: ?Sized>(
    list: &mut Vec<&'t T>,
    node: &'t T,
    inner: impl FnOnce(&T) -> MatchResult,
) -> MatchResult {
    inner(node)?;
    list.push(node);
    Ok(())
}

/// Non-raising projection of a matcher outcome.
pub fn does_match(result: MatchResult) -> bool {
    result.is_ok()
}

/// Pins a failure to the nearest enclosing statement/expression span,
/// unless a deeper span was already recorded.
pub fn located<T>(result: Result<T, TranslationError>, span: Span) -> Result<T, TranslationError> {
    result.map_err(|err| err.with_span(span))
}
