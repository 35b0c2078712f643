//! The diagnostic sink boundary.
//!
//! The parser never halts on a bad entry; it hands each [`Error`] to a
//! [`Report`] sink and resynchronizes. A plain `Vec<Error>` collects, and
//! [`LogReport`] forwards to whatever logger the embedding application
//! configured through the [`log`] facade.

use crate::{Error, ErrorLevel};

/// A sink for parse diagnostics. Implemented by anything with somewhere to
/// put an error: a collector, a console, a logger.
pub trait Report {
    fn report(&mut self, error: Error);
}

impl Report for Vec<Error> {
    fn report(&mut self, error: Error) {
        self.push(error);
    }
}

/// Routes diagnostics to the [`log`] facade, one record per error, at a
/// level matching the error's severity.
#[derive(Debug, Default)]
pub struct LogReport {
    reported: usize,
}

impl LogReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics seen so far.
    pub fn count(&self) -> usize {
        self.reported
    }
}

impl Report for LogReport {
    fn report(&mut self, error: Error) {
        self.reported += 1;
        match error.level {
            ErrorLevel::Error => log::error!("{}", error),
            ErrorLevel::Warning => log::warn!("{}", error),
            ErrorLevel::Info => log::info!("{}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Parser;
    use std::sync::Arc;

    #[test]
    fn vec_sink_collects() {
        let mut errors = Vec::new();
        let parser = Parser::new("nonsense\n", Arc::new("test".to_string()));
        let directives = parser.parse(&mut errors);
        assert!(directives.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn log_sink_counts() {
        let mut sink = LogReport::new();
        let parser = Parser::new("nonsense\n2015-01-01 open Assets:A\n", Arc::new("test".to_string()));
        let directives = parser.parse(&mut sink);
        assert_eq!(directives.len(), 1);
        assert_eq!(sink.count(), 1);
    }
}
