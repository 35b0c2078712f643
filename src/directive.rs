pub use chrono::NaiveDate as Date;
use getset::{CopyGetters, Getters};
pub use rust_decimal::Decimal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A line/column position in a source file.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn advance(&self, width: usize) -> Self {
        Position {
            col: self.col + width,
            line: self.line,
        }
    }
}

impl From<(usize, usize)> for Position {
    fn from(tuple: (usize, usize)) -> Self {
        Position {
            line: tuple.0,
            col: tuple.1,
        }
    }
}

/// A string wrapped in [`Arc`](std::sync::Arc)
/// representing the source file path.
pub type SrcFile = Arc<String>;

/// A range in a source file. Every directive and every diagnostic carries
/// one, tracking where in the input it came from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    pub file: SrcFile,
    pub start: Position,
    pub end: Position,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start.line, self.start.col)
    }
}

/// Kinds of errors encountered while turning input text into directives.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// IO error, e.g., an input file that cannot be read.
    Io,
    /// A lexical error: unrecognized text, an unterminated string, or a
    /// malformed date or number literal.
    Lex,
    /// A token sequence that matches no grammar production.
    Syntax,
}

/// The severity of an error. An entry producing an [`ErrorLevel::Error`]
/// is dropped from the output sequence.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorLevel {
    Info,
    Warning,
    Error,
}

/// Contains the full information of an error.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Error {
    pub msg: String,
    pub src: Source,
    pub r#type: ErrorType,
    pub level: ErrorLevel,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {}\n  {}:{}:{}",
            self.level, self.msg, self.src.file, self.src.start.line, self.src.start.col
        )
    }
}

pub type Currency = String;

/// A string wrapped in [`Arc`](std::sync::Arc) representing an account
/// name such as `Expenses:Food:Restaurant`. Interned per parse; no
/// existence or naming validation happens at this layer.
pub type Account = Arc<String>;

/// A [`Decimal`] number plus the currency.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
    pub number: Decimal,
    pub currency: Currency,
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}

/// The primary date of a directive plus the optional settlement date
/// written as `date = date`. The settlement date is either a real calendar
/// date or absent, never a sentinel value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatePair {
    pub date: Date,
    pub other: Option<Date>,
}

impl fmt::Display for DatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.other {
            Some(other) => write!(f, "{} = {}", self.date, other),
            None => write!(f, "{}", self.date),
        }
    }
}

/// The flag slot of a transaction header.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnFlag {
    /// The bare `txn` keyword, no explicit flag character.
    Default,
    /// An explicit one-character flag such as `*` or `!`.
    Char(char),
}

impl fmt::Display for TxnFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnFlag::Default => write!(f, "txn"),
            TxnFlag::Char(c) => write!(f, "{}", c),
        }
    }
}

/// A lot annotation on a posting amount: the acquisition cost, optionally
/// with the acquisition date, as in `{9.50 USD / 2015-01-01}`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CostSpec {
    pub amount: Amount,
    pub date: Option<Date>,
}

impl fmt::Display for CostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{{{} / {}}}", self.amount, date),
            None => write!(f, "{{{}}}", self.amount),
        }
    }
}

/// The unit price (`@`) or total price (`@@`) attached to a posting.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PriceAnnotation {
    Unit(Amount),
    Total(Amount),
}

impl fmt::Display for PriceAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceAnnotation::Unit(amount) => write!(f, "@ {}", amount),
            PriceAnnotation::Total(amount) => write!(f, "@@ {}", amount),
        }
    }
}

/// One account movement line inside a [`Transaction`]. The amount may be
/// elided in the source; resolving it is the booking engine's job, not
/// the parser's.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub flag: Option<char>,
    pub account: Account,
    pub amount: Option<Amount>,
    pub cost: Option<CostSpec>,
    pub price: Option<PriceAnnotation>,
    pub src: Source,
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(flag) = self.flag {
            write!(f, "{} ", flag)?;
        }
        match &self.amount {
            Some(amount) => {
                let width = std::cmp::max(self.account.len() + 1, f.width().unwrap_or(34));
                write!(f, "{:width$}{}", self.account, amount, width = width)?;
            }
            None => write!(f, "{}", self.account)?,
        }
        if let Some(cost) = &self.cost {
            write!(f, " {}", cost)?;
        }
        if let Some(price) = &self.price {
            write!(f, " {}", price)?;
        }
        Ok(())
    }
}

/// A transaction entry: a date pair, a flag, a description, and the owned,
/// ordered sequence of postings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Transaction {
    /// Returns the primary and optional settlement date.
    #[getset(get_copy = "pub")]
    pub(crate) dates: DatePair,

    /// Returns the transaction flag.
    #[getset(get_copy = "pub")]
    pub(crate) flag: TxnFlag,

    /// Returns the payee, when the description carried one.
    #[getset(get = "pub")]
    pub(crate) payee: Option<String>,

    /// Returns the narration.
    #[getset(get = "pub")]
    pub(crate) narration: String,

    /// Returns the postings of this transaction, in source order.
    #[getset(get = "pub")]
    pub(crate) postings: Vec<Posting>,

    /// Returns the source of this transaction.
    #[getset(get = "pub")]
    pub(crate) src: Source,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dates, self.flag)?;
        match &self.payee {
            Some(payee) => write!(f, " \"{}\" | \"{}\"", payee, self.narration)?,
            None => write!(f, " \"{}\"", self.narration)?,
        }
        for posting in &self.postings {
            write!(f, "\n  {}", posting)?;
        }
        Ok(())
    }
}

/// An `open` directive: account, allowed currencies (possibly empty, in
/// source order), and an optional booking-method string.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Open {
    pub date: Date,
    pub account: Account,
    pub currencies: Vec<Currency>,
    pub booking: Option<String>,
    pub src: Source,
}

/// A `close` directive.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Close {
    pub date: Date,
    pub account: Account,
    pub src: Source,
}

/// A `pad` directive: fill `account` from `source_account`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pad {
    pub date: Date,
    pub account: Account,
    pub source_account: Account,
    pub src: Source,
}

/// A balance assertion, written with the `check` keyword.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub date: Date,
    pub account: Account,
    pub amount: Amount,
    pub src: Source,
}

/// A `price` observation for a currency.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub date: Date,
    pub currency: Currency,
    pub amount: Amount,
    pub src: Source,
}

/// A `note` attached to an account.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub date: Date,
    pub account: Account,
    pub memo: String,
    pub src: Source,
}

/// An `event` directive: a named value taking effect on a date.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub date: Date,
    pub name: String,
    pub value: String,
    pub src: Source,
}

/// A `location` directive.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub date: Date,
    pub place: String,
    pub src: Source,
}

/// A `begintag`/`endtag` scope marker. The tag-scope semantics live in a
/// later layer; the parser records the markers in stream order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagScope {
    pub tag: String,
    pub src: Source,
}

/// One top-level ledger entry. The parse result is an ordered sequence of
/// these; source order is preserved and semantically meaningful.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Txn(Transaction),
    Open(Open),
    Close(Close),
    Pad(Pad),
    Balance(Balance),
    Price(Price),
    Note(Note),
    Event(Event),
    Location(Location),
    BeginTag(TagScope),
    EndTag(TagScope),
}

impl Directive {
    /// The directive's primary date; tag-scope markers carry none.
    pub fn date(&self) -> Option<Date> {
        match self {
            Directive::Txn(txn) => Some(txn.dates.date),
            Directive::Open(open) => Some(open.date),
            Directive::Close(close) => Some(close.date),
            Directive::Pad(pad) => Some(pad.date),
            Directive::Balance(balance) => Some(balance.date),
            Directive::Price(price) => Some(price.date),
            Directive::Note(note) => Some(note.date),
            Directive::Event(event) => Some(event.date),
            Directive::Location(location) => Some(location.date),
            Directive::BeginTag(_) | Directive::EndTag(_) => None,
        }
    }

    pub fn src(&self) -> &Source {
        match self {
            Directive::Txn(txn) => &txn.src,
            Directive::Open(open) => &open.src,
            Directive::Close(close) => &close.src,
            Directive::Pad(pad) => &pad.src,
            Directive::Balance(balance) => &balance.src,
            Directive::Price(price) => &price.src,
            Directive::Note(note) => &note.src,
            Directive::Event(event) => &event.src,
            Directive::Location(location) => &location.src,
            Directive::BeginTag(scope) | Directive::EndTag(scope) => &scope.src,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Txn(txn) => write!(f, "{}", txn),
            Directive::Open(open) => {
                write!(f, "{} open {}", open.date, open.account)?;
                let mut sep = " ";
                for currency in &open.currencies {
                    write!(f, "{}{}", sep, currency)?;
                    sep = ", ";
                }
                if let Some(booking) = &open.booking {
                    write!(f, " \"{}\"", booking)?;
                }
                Ok(())
            }
            Directive::Close(close) => write!(f, "{} close {}", close.date, close.account),
            Directive::Pad(pad) => {
                write!(f, "{} pad {} {}", pad.date, pad.account, pad.source_account)
            }
            Directive::Balance(balance) => write!(
                f,
                "{} check {} {}",
                balance.date, balance.account, balance.amount
            ),
            Directive::Price(price) => {
                write!(f, "{} price {} {}", price.date, price.currency, price.amount)
            }
            Directive::Note(note) => {
                write!(f, "{} note {} \"{}\"", note.date, note.account, note.memo)
            }
            Directive::Event(event) => write!(
                f,
                "{} event \"{}\" \"{}\"",
                event.date, event.name, event.value
            ),
            Directive::Location(location) => {
                write!(f, "{} location \"{}\"", location.date, location.place)
            }
            Directive::BeginTag(scope) => write!(f, "begintag \"{}\"", scope.tag),
            Directive::EndTag(scope) => write!(f, "endtag \"{}\"", scope.tag),
        }
    }
}

/// The parse result for one source: the ordered directive stream.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Ledger {
    /// Returns the directives, in source order.
    #[getset(get = "pub")]
    pub(crate) directives: Vec<Directive>,
}

impl Ledger {
    pub fn from_file(path: &str) -> (Self, Vec<Error>) {
        let (directives, errors) = crate::parse::parse_file(path);
        (Ledger { directives }, errors)
    }

    pub fn from_text(text: &str, name: &str) -> (Self, Vec<Error>) {
        let (directives, errors) = crate::parse::parse_text(text, name);
        (Ledger { directives }, errors)
    }

    pub fn into_directives(self) -> Vec<Directive> {
        self.directives
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in &self.directives {
            writeln!(f, "{}", directive)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(text: &str) -> Amount {
        Amount {
            number: text.parse().unwrap(),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn amount_renders_number_then_currency() {
        assert_eq!(usd("-244.06").to_string(), "-244.06 USD");
    }

    #[test]
    fn date_pair_renders_settlement_only_when_present() {
        let date = "2015-03-20".parse::<Date>().unwrap();
        let pair = DatePair { date, other: None };
        assert_eq!(pair.to_string(), "2015-03-20");
        let pair = DatePair {
            date,
            other: Some("2015-03-25".parse().unwrap()),
        };
        assert_eq!(pair.to_string(), "2015-03-20 = 2015-03-25");
    }

    #[test]
    fn txn_flag_renders_keyword_or_char() {
        assert_eq!(TxnFlag::Default.to_string(), "txn");
        assert_eq!(TxnFlag::Char('*').to_string(), "*");
    }

    #[test]
    fn cost_spec_renders_lot_date_after_slash() {
        let cost = CostSpec {
            amount: usd("9.50"),
            date: Some("2015-01-01".parse().unwrap()),
        };
        assert_eq!(cost.to_string(), "{9.50 USD / 2015-01-01}");
        let cost = CostSpec {
            amount: usd("9.50"),
            date: None,
        };
        assert_eq!(cost.to_string(), "{9.50 USD}");
    }

    #[test]
    fn price_annotation_renders_at_signs() {
        assert_eq!(PriceAnnotation::Unit(usd("1.09")).to_string(), "@ 1.09 USD");
        assert_eq!(
            PriceAnnotation::Total(usd("436.01")).to_string(),
            "@@ 436.01 USD"
        );
    }
}
