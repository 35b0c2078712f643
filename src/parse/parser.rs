use super::lexer::Lexer;
use super::token::Token;
use crate::report::Report;
use crate::{
    Account, Amount, Balance, Close, CostSpec, Currency, Date, DatePair, Decimal, Directive,
    Error, ErrorLevel, ErrorType, Event, Location, Note, Open, Pad, Position, Posting, Price,
    PriceAnnotation, Source, SrcFile, TagScope, Transaction, TxnFlag,
};

use std::{collections::HashMap, fs, sync::Arc};

/// The grammar engine for one ledger source.
///
/// Hand-written recursive descent over the token stream, with exactly one
/// token of lookahead: every optional-clause decision (flag vs `txn`,
/// settlement date, cost, price annotation, elided amount) is made from
/// `peek`, and no token is ever consumed speculatively. Each successful
/// top-level production appends one [`Directive`] to the output, in source
/// order. Errors go to the caller's [`Report`] sink and trigger
/// resynchronization instead of aborting the parse.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    file: SrcFile,
    accounts: HashMap<&'source str, Account>,
}

impl<'source> Parser<'source> {
    pub fn new(text: &'source str, file: SrcFile) -> Self {
        Parser {
            lexer: Lexer::new(text, file.clone()),
            file,
            accounts: HashMap::new(),
        }
    }

    /// Consumes the whole source, reporting errors to `sink`.
    pub fn parse(mut self, sink: &mut dyn Report) -> Vec<Directive> {
        let mut directives = Vec::new();
        self.parse_directives(&mut directives, sink);
        directives
    }

    fn src_from(&self, start: Position) -> Source {
        Source {
            start,
            end: self.lexer.last_token_end(),
            file: self.file.clone(),
        }
    }

    fn unexpected<T>(&mut self, token: Token, text: &str) -> Result<T, Error> {
        let start = self.lexer.location();
        let (r#type, msg) = match token {
            Token::Error => (ErrorType::Lex, format!("Unrecognized input {:?}.", text)),
            Token::UnterminatedString => (ErrorType::Lex, "Unterminated string.".to_string()),
            _ => (
                ErrorType::Syntax,
                format!("Unexpected token {:?}({}).", token, text),
            ),
        };
        Err(Error {
            level: ErrorLevel::Error,
            r#type,
            msg,
            src: Source {
                file: self.file.clone(),
                start,
                end: start.advance(text.chars().count()),
            },
        })
    }

    fn parse_directives(&mut self, directives: &mut Vec<Directive>, sink: &mut dyn Report) {
        while let Ok((token, text)) = self.lexer.peek() {
            let r = match token {
                // blank lines are no-op entries between directives
                Token::Eol => {
                    self.lexer.consume();
                    Ok(())
                }
                Token::Date => self.parse_dated_entry(directives),
                Token::BeginTag | Token::EndTag => self.parse_tag_scope(directives),
                _ => self.unexpected(token, text),
            };
            if let Err(err) = r {
                sink.report(err);
                self.synchronize();
            }
        }
    }

    /// Skips to the start of the next line that opens a top-level context,
    /// dropping any indented continuation of the broken construct.
    fn synchronize(&mut self) {
        while let Ok((token, _)) = self.lexer.peek() {
            self.lexer.consume();
            if token == Token::Eol {
                if let Ok((Token::Indent, _)) = self.lexer.peek() {
                    continue;
                }
                break;
            }
        }
    }

    /// The trailing end-of-line of a directive; end of input closes the
    /// final line.
    fn take_eol(&mut self) -> Result<(), Error> {
        match self.lexer.peek() {
            Ok((Token::Eol, _)) => {
                self.lexer.consume();
                Ok(())
            }
            Err(_) => Ok(()),
            Ok((token, text)) => self.unexpected(token, text),
        }
    }

    fn parse_dated_entry(&mut self, directives: &mut Vec<Directive>) -> Result<(), Error> {
        let start = self.lexer.location();
        let date = self.parse_date()?;
        let other = if let Ok((Token::Equal, _)) = self.lexer.peek() {
            self.lexer.consume();
            Some(self.parse_date()?)
        } else {
            None
        };
        let (token, text) = self.lexer.peek()?;
        if other.is_some() && !matches!(token, Token::Txn | Token::Flag) {
            // a settlement date belongs to transactions only
            return self.unexpected(token, text);
        }
        let directive = match token {
            Token::Txn | Token::Flag => self.parse_txn(DatePair { date, other }, start)?,
            Token::Open => self.parse_open(date, start)?,
            Token::Close => self.parse_close(date, start)?,
            Token::Pad => self.parse_pad(date, start)?,
            Token::Check => self.parse_balance(date, start)?,
            Token::Price => self.parse_price_entry(date, start)?,
            Token::Note => self.parse_note(date, start)?,
            Token::Event => self.parse_event(date, start)?,
            Token::Location => self.parse_location(date, start)?,
            _ => return self.unexpected(token, text),
        };
        directives.push(directive);
        Ok(())
    }

    fn parse_txn(&mut self, dates: DatePair, start: Position) -> Result<Directive, Error> {
        let (token, text) = self.lexer.peek()?;
        let flag = match token {
            Token::Txn => TxnFlag::Default,
            Token::Flag => TxnFlag::Char(text.chars().next().unwrap()),
            _ => return self.unexpected(token, text),
        };
        self.lexer.consume();
        let first = self.parse_string()?.to_string();
        let (payee, narration) = match self.lexer.peek() {
            Ok((Token::Pipe, _)) => {
                self.lexer.consume();
                (Some(first), self.parse_string()?.to_string())
            }
            Ok((Token::String, _)) => (Some(first), self.parse_string()?.to_string()),
            _ => (None, first),
        };
        self.take_eol()?;
        let postings = self.parse_postings()?;
        Ok(Directive::Txn(Transaction {
            dates,
            flag,
            payee,
            narration,
            postings,
            src: self.src_from(start),
        }))
    }

    fn parse_postings(&mut self) -> Result<Vec<Posting>, Error> {
        let mut postings = Vec::new();
        // the posting list ends at the first line that is not indented
        while let Ok((Token::Indent, _)) = self.lexer.peek() {
            self.lexer.consume();
            let start = self.lexer.location();
            let flag = match self.lexer.peek()? {
                (Token::Flag, text) => {
                    let flag = text.chars().next().unwrap();
                    self.lexer.consume();
                    Some(flag)
                }
                _ => None,
            };
            let account = self.parse_account()?;
            let mut amount = None;
            let mut cost = None;
            let mut price = None;
            if let Ok((Token::Number, _)) = self.lexer.peek() {
                amount = Some(self.parse_amount()?);
                cost = self.parse_cost()?;
                price = self.parse_price()?;
            }
            self.take_eol()?;
            postings.push(Posting {
                flag,
                account,
                amount,
                cost,
                price,
                src: self.src_from(start),
            });
        }
        Ok(postings)
    }

    fn parse_cost(&mut self) -> Result<Option<CostSpec>, Error> {
        match self.lexer.peek() {
            Ok((Token::LBrace, _)) => {
                self.lexer.consume();
                let amount = self.parse_amount()?;
                let date = match self.lexer.peek() {
                    Ok((Token::Slash, _)) => {
                        self.lexer.consume();
                        Some(self.parse_date()?)
                    }
                    _ => None,
                };
                self.lexer.take(Token::RBrace)?;
                Ok(Some(CostSpec { amount, date }))
            }
            _ => Ok(None),
        }
    }

    fn parse_price(&mut self) -> Result<Option<PriceAnnotation>, Error> {
        if let Ok((token, _)) = self.lexer.peek() {
            if token == Token::AtUnit || token == Token::AtTotal {
                self.lexer.consume();
                let amount = self.parse_amount()?;
                return if token == Token::AtUnit {
                    Ok(Some(PriceAnnotation::Unit(amount)))
                } else {
                    Ok(Some(PriceAnnotation::Total(amount)))
                };
            }
        }
        Ok(None)
    }

    fn parse_open(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Open)?;
        let account = self.parse_account()?;
        let currencies = self.parse_currency_list()?;
        let booking = match self.lexer.peek() {
            Ok((Token::String, _)) => Some(self.parse_string()?.to_string()),
            _ => None,
        };
        self.take_eol()?;
        Ok(Directive::Open(Open {
            date,
            account,
            currencies,
            booking,
            src: self.src_from(start),
        }))
    }

    fn parse_close(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Close)?;
        let account = self.parse_account()?;
        self.take_eol()?;
        Ok(Directive::Close(Close {
            date,
            account,
            src: self.src_from(start),
        }))
    }

    fn parse_pad(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Pad)?;
        let account = self.parse_account()?;
        let source_account = self.parse_account()?;
        self.take_eol()?;
        Ok(Directive::Pad(Pad {
            date,
            account,
            source_account,
            src: self.src_from(start),
        }))
    }

    fn parse_balance(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Check)?;
        let account = self.parse_account()?;
        let amount = self.parse_amount()?;
        self.take_eol()?;
        Ok(Directive::Balance(Balance {
            date,
            account,
            amount,
            src: self.src_from(start),
        }))
    }

    fn parse_price_entry(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Price)?;
        let currency = self.lexer.take(Token::Currency)?.to_string();
        let amount = self.parse_amount()?;
        self.take_eol()?;
        Ok(Directive::Price(Price {
            date,
            currency,
            amount,
            src: self.src_from(start),
        }))
    }

    fn parse_note(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Note)?;
        let account = self.parse_account()?;
        let memo = self.parse_string()?.to_string();
        self.take_eol()?;
        Ok(Directive::Note(Note {
            date,
            account,
            memo,
            src: self.src_from(start),
        }))
    }

    fn parse_event(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Event)?;
        let name = self.parse_string()?.to_string();
        let value = self.parse_string()?.to_string();
        self.take_eol()?;
        Ok(Directive::Event(Event {
            date,
            name,
            value,
            src: self.src_from(start),
        }))
    }

    fn parse_location(&mut self, date: Date, start: Position) -> Result<Directive, Error> {
        self.lexer.take(Token::Location)?;
        let place = self.parse_string()?.to_string();
        self.take_eol()?;
        Ok(Directive::Location(Location {
            date,
            place,
            src: self.src_from(start),
        }))
    }

    fn parse_tag_scope(&mut self, directives: &mut Vec<Directive>) -> Result<(), Error> {
        let start = self.lexer.location();
        let (token, _) = self.lexer.peek()?;
        self.lexer.consume();
        let tag = self.parse_string()?.to_string();
        self.take_eol()?;
        let scope = TagScope {
            tag,
            src: self.src_from(start),
        };
        directives.push(match token {
            Token::BeginTag => Directive::BeginTag(scope),
            _ => Directive::EndTag(scope),
        });
        Ok(())
    }

    fn parse_account(&mut self) -> Result<Account, Error> {
        let account_str = self.lexer.take(Token::Account)?;
        let account = self
            .accounts
            .entry(account_str)
            .or_insert_with(|| Arc::new(account_str.to_string()))
            .clone();
        Ok(account)
    }

    fn parse_currency_list(&mut self) -> Result<Vec<Currency>, Error> {
        let mut currencies = Vec::new();
        if let Ok((Token::Currency, currency)) = self.lexer.peek() {
            currencies.push(currency.to_string());
            self.lexer.consume();
            while let Ok((Token::Comma, _)) = self.lexer.peek() {
                self.lexer.consume();
                let currency = self.lexer.take(Token::Currency)?;
                currencies.push(currency.to_string());
            }
        }
        Ok(currencies)
    }

    #[inline]
    fn remove_quotes(input: &str) -> &str {
        let mut chars = input.chars();
        chars.next();
        chars.next_back();
        chars.as_str()
    }

    fn parse_string(&mut self) -> Result<&'source str, Error> {
        let quoted_str = self.lexer.take(Token::String)?;
        Ok(Self::remove_quotes(quoted_str))
    }

    fn parse_date(&mut self) -> Result<Date, Error> {
        let start = self.lexer.location();
        let date_str = self.lexer.take(Token::Date)?;
        date_str.parse::<Date>().map_err(|_| Error {
            msg: format!("Invalid date: {}.", date_str),
            src: self.src_from(start),
            r#type: ErrorType::Lex,
            level: ErrorLevel::Error,
        })
    }

    fn parse_amount(&mut self) -> Result<Amount, Error> {
        let start = self.lexer.location();
        let num_str = self.lexer.take(Token::Number)?;
        let number = num_str.parse::<Decimal>().map_err(|e| Error {
            msg: e.to_string(),
            src: self.src_from(start),
            level: ErrorLevel::Error,
            r#type: ErrorType::Lex,
        })?;
        let currency = self.lexer.take(Token::Currency)?;
        Ok(Amount {
            number,
            currency: currency.to_string(),
        })
    }
}

/// Parses one ledger source held in memory. Returns the best-effort
/// directive sequence and every diagnostic raised along the way.
pub fn parse_text(text: &str, name: &str) -> (Vec<Directive>, Vec<Error>) {
    let mut errors = Vec::new();
    let directives = Parser::new(text, Arc::new(name.to_string())).parse(&mut errors);
    (directives, errors)
}

/// Reads and parses a ledger file.
pub fn parse_file(path: &str) -> (Vec<Directive>, Vec<Error>) {
    match fs::read_to_string(path) {
        Ok(text) => parse_text(&text, path),
        Err(io_error) => {
            let src = Source {
                file: Arc::new(path.to_string()),
                start: Position { line: 1, col: 1 },
                end: Position { line: 1, col: 1 },
            };
            let error = Error {
                r#type: ErrorType::Io,
                level: ErrorLevel::Error,
                msg: format!("Couldn't read {}: {:?}", path, io_error),
                src,
            };
            (Vec::new(), vec![error])
        }
    }
}
