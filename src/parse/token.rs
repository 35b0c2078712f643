use logos::Logos;

/// Characters accepted in the transaction-flag slot. The ledger language
/// leaves the full legal set open; widening it is a change here only.
pub const FLAG_CHARS: &str = "*!&#?%";

#[derive(Debug, PartialEq, Logos, Clone, Copy)]
pub enum Token {
    /// A run of blanks. Surfaced by the lexer as significant indentation
    /// only at the start of a line followed by actual content; silent
    /// everywhere else.
    #[regex(r"[ \f\r\t\v]+")]
    Indent,

    #[token("\n")]
    Eol,

    #[regex(r";[^\n]*")]
    Comment,

    #[token("txn")]
    Txn,

    #[token("check")]
    Check,

    #[token("open")]
    Open,

    #[token("close")]
    Close,

    #[token("pad")]
    Pad,

    #[token("event")]
    Event,

    #[token("price")]
    Price,

    #[token("location")]
    Location,

    #[token("note")]
    Note,

    #[token("begintag")]
    BeginTag,

    #[token("endtag")]
    EndTag,

    #[token("|")]
    Pipe,

    #[token("@")]
    AtUnit,

    #[token("@@")]
    AtTotal,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("=")]
    Equal,

    #[token(",")]
    Comma,

    #[token("/")]
    Slash,

    #[regex(r"[*!&#?%]")]
    Flag,

    #[regex(r"\d\d\d\d-\d\d-\d\d")]
    Date,

    #[regex(r#""[^"\n]*""#)]
    String,

    #[regex(r#""[^"\n]*"#)]
    UnterminatedString,

    #[regex(r"[A-Z][A-Za-z0-9\-]*(:[A-Z0-9][A-Za-z0-9\-]*)+")]
    Account,

    #[regex(r"[A-Z][A-Z0-9]+")]
    Currency,

    #[regex(r"[\-\+]?\d+(\.\d*)?")]
    #[regex(r"[\-\+]?\.\d+")]
    Number,

    #[error]
    Error,
}
