//! # tally
//!
//! tally parses text-based double-entry ledger files into an ordered
//! stream of typed [`Directive`] values. It covers the lexing and grammar
//! layer only: amounts may be elided, accounts are taken on faith, and
//! nothing is balanced here; those jobs belong to a downstream booking
//! engine. A malformed entry is reported and skipped, never fatal to the
//! rest of the file.

mod directive;
pub mod parse;
pub mod report;

pub use directive::*;
