//! Table name predicates used to skip framework-internal tables.

use regex::RegexSet;

use crate::error::{Error, Result};

/// Tables that never get generated components: migrations bookkeeping,
/// authentication/session storage, queues and logs.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    r"^migrations$",
    r"^schema_migrations$",
    r"^(password_resets|password_reset_tokens|personal_access_tokens)$",
    r"^(sessions|cache|cache_locks|jobs|job_batches|failed_jobs)$",
    r"^oauth_",
    r"^auth_",
    r"_logs?$",
];

/// Name predicate built from regular expressions.
#[derive(Debug, Clone)]
pub struct TableFilter {
    excludes: RegexSet,
    only: Option<RegexSet>,
}

impl TableFilter {
    /// Exclude tables matching any of `patterns`.
    pub fn excluding<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excludes = RegexSet::new(patterns)
            .map_err(|e| Error::Config(format!("invalid table exclude pattern: {e}")))?;
        Ok(Self {
            excludes,
            only: None,
        })
    }

    /// [`DEFAULT_EXCLUDES`] plus any caller-supplied patterns.
    pub fn with_defaults<I, S>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = DEFAULT_EXCLUDES
            .iter()
            .map(|p| p.to_string())
            .chain(extra.into_iter().map(|p| p.as_ref().to_string()))
            .collect();
        Self::excluding(patterns)
    }

    /// Restrict to tables whose name is exactly one of `tables`.
    pub fn only<I, S>(mut self, tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = tables
            .into_iter()
            .map(|t| format!("^{}$", regex::escape(t.as_ref())))
            .collect();
        if patterns.is_empty() {
            return Ok(self);
        }
        self.only = Some(
            RegexSet::new(patterns)
                .map_err(|e| Error::Config(format!("invalid table name: {e}")))?,
        );
        Ok(self)
    }

    /// Whether an explicit table list narrows the selection.
    pub fn is_restricted(&self) -> bool {
        self.only.is_some()
    }

    /// Sorted, deduplicated exclude patterns, as recorded in the components cache.
    pub fn exclude_patterns(&self) -> Vec<String> {
        let mut patterns = self.excludes.patterns().to_vec();
        patterns.sort();
        patterns.dedup();
        patterns
    }

    pub fn accepts(&self, table: &str) -> bool {
        if self.excludes.is_match(table) {
            return false;
        }
        self.only.as_ref().map_or(true, |only| only.is_match(table))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults_skip_internal_tables() {
        let filter = TableFilter::with_defaults(Vec::<String>::new()).unwrap();
        for internal in ["migrations", "auth_tokens", "failed_jobs", "request_logs", "oauth_clients"] {
            assert!(!filter.accepts(internal), "{internal} should be excluded");
        }
        for table in ["people", "posts", "catalog", "blogs"] {
            assert!(filter.accepts(table), "{table} should be kept");
        }
    }

    #[test]
    fn extra_patterns_extend_defaults() {
        let filter = TableFilter::with_defaults(["^tmp_"]).unwrap();
        assert!(!filter.accepts("tmp_import"));
        assert!(!filter.accepts("migrations"));
    }

    #[test]
    fn only_restricts_to_named_tables() {
        let filter = TableFilter::excluding(Vec::<String>::new())
            .unwrap()
            .only(["people"])
            .unwrap();
        assert!(filter.accepts("people"));
        assert!(!filter.accepts("people_archive"));
    }

    #[test]
    fn exclude_patterns_ignore_order_and_duplicates() {
        let a = TableFilter::excluding(["^b$", "^a$", "^b$"]).unwrap();
        let b = TableFilter::excluding(["^a$", "^b$"]).unwrap().only(["people"]).unwrap();
        assert_eq!(a.exclude_patterns(), vec!["^a$", "^b$"]);
        assert_eq!(a.exclude_patterns(), b.exclude_patterns());
        assert_ne!(
            TableFilter::with_defaults(["^posts$"]).unwrap().exclude_patterns(),
            TableFilter::with_defaults(Vec::<String>::new()).unwrap().exclude_patterns()
        );
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        assert!(matches!(TableFilter::excluding(["("]), Err(Error::Config(_))));
    }
}
