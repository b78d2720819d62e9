//! Bounded diagnostic trails
//!
//! Logs carry the trace of the innermost cause, not of the wrappers around
//! it, and never more than a fixed number of lines.

use crate::exception::CoreException;
use crate::failure::Failure;

pub const DEFAULT_TRAIL_LIMIT: usize = 10;

/// Trace lines of the innermost cause of `failure`, at most `limit` of them.
#[must_use]
pub fn cause_lines(failure: &Failure, limit: usize) -> Vec<String> {
    let mut current = failure;
    while let Some(inner) = current.cause() {
        current = inner;
    }
    current.trace().iter().take(limit).cloned().collect()
}

/// Same as [`cause_lines`], starting from a classified exception.
#[must_use]
pub fn core_cause_lines(core: &CoreException, limit: usize) -> Vec<String> {
    match core.cause() {
        Some(cause) => cause_lines(cause, limit),
        None => core.trace().iter().take(limit).cloned().collect(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::category::ErrorCategory;
    use crate::error::Error;

    fn lines(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}::frame{i}")).collect()
    }

    #[test]
    fn takes_lines_from_innermost_cause_only() {
        let innermost = Failure::msg("db down").with_trace(lines("inner", 3));
        let middle = Failure::msg("repo failed")
            .with_trace(lines("middle", 3))
            .with_cause(innermost);
        let outer = Failure::msg("service failed")
            .with_trace(lines("outer", 3))
            .with_cause(middle);

        let trail = cause_lines(&outer, DEFAULT_TRAIL_LIMIT);
        assert_eq!(trail, lines("inner", 3));
    }

    #[test]
    fn caps_at_limit() {
        let innermost = Failure::msg("deep").with_trace(lines("inner", 25));
        let outer = Failure::msg("outer").with_cause(Failure::msg("mid").with_cause(innermost));

        assert_eq!(cause_lines(&outer, DEFAULT_TRAIL_LIMIT).len(), 10);
        assert_eq!(cause_lines(&outer, 4), lines("inner", 4));
    }

    #[test]
    fn core_without_cause_uses_own_trace() {
        let core = CoreException::new(ErrorCategory::Unexpected, vec![Error::new("x")], "x")
            .with_trace(lines("core", 2));
        assert_eq!(core_cause_lines(&core, 10), lines("core", 2));

        let core = core.with_cause(Failure::msg("root").with_trace(lines("root", 1)));
        assert_eq!(core_cause_lines(&core, 10), lines("root", 1));
    }

    #[test]
    fn default_trace_is_the_call_site() {
        let trail = cause_lines(&Failure::msg("here"), DEFAULT_TRAIL_LIMIT);
        assert_eq!(trail.len(), 1);
        assert!(trail[0].contains("trail.rs"));
    }
}
