use super::Token;
use crate::{Error, ErrorLevel, ErrorType, Position, Source, SrcFile};
use logos::{Lexer as LogosLexer, Logos};
use std::collections::VecDeque;

/// Pull-based scanner over one ledger source.
///
/// Wraps the raw [`logos`] lexer and applies the line discipline: comments
/// and in-line whitespace disappear, a newline becomes a [`Token::Eol`],
/// and leading whitespace becomes a [`Token::Indent`] only when the rest of
/// the line carries actual content. The grammar engine drives it through
/// `peek`/`consume`/`take` with exactly one token of lookahead.
pub struct Lexer<'source> {
    llex: LogosLexer<'source, Token>,
    // Ready-to-serve tokens with their start positions. Holds at most two
    // entries: a synthesized Indent plus the token that made it significant.
    queue: VecDeque<(Token, &'source str, Position)>,
    scan_pos: Position,
    last_token_end: Position,
    at_line_start: bool,
    file: SrcFile,
}

impl<'source> Lexer<'source> {
    pub fn new(src: &'source str, file: SrcFile) -> Self {
        Lexer {
            llex: Token::lexer(src),
            queue: VecDeque::new(),
            scan_pos: (1, 1).into(),
            last_token_end: (1, 1).into(),
            at_line_start: true,
            file,
        }
    }

    pub fn last_token_end(&self) -> Position {
        self.last_token_end
    }

    /// Start position of the next token, or of the end of input.
    pub fn location(&mut self) -> Position {
        self.fill();
        match self.queue.front() {
            Some(&(_, _, pos)) => pos,
            None => self.scan_pos,
        }
    }

    fn fill(&mut self) {
        let mut indent: Option<(&'source str, Position)> = None;
        while self.queue.is_empty() {
            let token = match self.llex.next() {
                Some(token) => token,
                None => return,
            };
            let text = self.llex.slice();
            let start = self.scan_pos;
            self.scan_pos.col += text.chars().count();
            match token {
                Token::Comment => {}
                Token::Indent => {
                    if self.at_line_start {
                        indent = Some((text, start));
                    }
                }
                Token::Eol => {
                    // A line of nothing but blanks or a comment carries no
                    // indentation signal.
                    indent = None;
                    self.queue.push_back((Token::Eol, text, start));
                    self.scan_pos = (start.line + 1, 1).into();
                    self.at_line_start = true;
                }
                _ => {
                    if let Some((itext, istart)) = indent.take() {
                        self.queue.push_back((Token::Indent, itext, istart));
                    }
                    self.at_line_start = false;
                    self.queue.push_back((token, text, start));
                }
            }
        }
    }

    pub fn peek(&mut self) -> Result<(Token, &'source str), Error> {
        self.fill();
        match self.queue.front() {
            Some(&(token, text, _)) => Ok((token, text)),
            None => Err(Error {
                msg: "Unexpected end of file.".to_string(),
                src: Source {
                    file: self.file.clone(),
                    start: self.scan_pos,
                    end: self.scan_pos,
                },
                r#type: ErrorType::Syntax,
                level: ErrorLevel::Error,
            }),
        }
    }

    #[inline]
    pub fn consume(&mut self) {
        let (_, text, start) = self.queue.pop_front().unwrap();
        self.last_token_end = start.advance(text.chars().count());
    }

    pub fn take(&mut self, expected: Token) -> Result<&'source str, Error> {
        let (token, text) = self.peek()?;
        if token != expected {
            let start = self.location();
            Err(Error {
                msg: format!("Expect {:?}, found {:?}({:?})", expected, &token, text),
                src: Source {
                    file: self.file.clone(),
                    start,
                    end: start.advance(text.chars().count()),
                },
                r#type: match token {
                    Token::Error | Token::UnterminatedString => ErrorType::Lex,
                    _ => ErrorType::Syntax,
                },
                level: ErrorLevel::Error,
            })
        } else {
            self.consume();
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn drain(src: &str) -> Vec<(Token, String)> {
        let mut lexer = Lexer::new(src, Arc::new("test".to_string()));
        let mut out = vec![];
        while let Ok((token, text)) = lexer.peek() {
            out.push((token, text.to_string()));
            lexer.consume();
        }
        out
    }

    fn kinds(src: &str) -> Vec<Token> {
        drain(src).into_iter().map(|(token, _)| token).collect()
    }

    #[test]
    fn classifies_directive_header() {
        assert_eq!(
            kinds("2015-03-20 * \"Dinner\"\n"),
            vec![Token::Date, Token::Flag, Token::String, Token::Eol]
        );
    }

    #[test]
    fn date_wins_over_number() {
        assert_eq!(kinds("2015-03-20"), vec![Token::Date]);
        assert_eq!(kinds("2015"), vec![Token::Number]);
        assert_eq!(kinds("-244.06"), vec![Token::Number]);
    }

    #[test]
    fn currency_and_account_are_distinct() {
        assert_eq!(kinds("USD"), vec![Token::Currency]);
        assert_eq!(kinds("Expenses:Food:Restaurant"), vec![Token::Account]);
    }

    #[test]
    fn indent_is_significant_only_with_content() {
        assert_eq!(
            kinds("  Income:Sheila -244.06 USD\n"),
            vec![
                Token::Indent,
                Token::Account,
                Token::Number,
                Token::Currency,
                Token::Eol
            ]
        );
        // blank and comment-only lines degrade to a bare end-of-line
        assert_eq!(kinds("   \n"), vec![Token::Eol]);
        assert_eq!(kinds("  ; remark\n"), vec![Token::Eol]);
    }

    #[test]
    fn midline_whitespace_and_comments_are_silent() {
        assert_eq!(
            kinds("2015-01-01 open Assets:Cash ; opening\n"),
            vec![Token::Date, Token::Open, Token::Account, Token::Eol]
        );
    }

    #[test]
    fn punctuation_tokens() {
        assert_eq!(
            kinds("{ 9.50 USD / 2015-01-01 }"),
            vec![
                Token::LBrace,
                Token::Number,
                Token::Currency,
                Token::Slash,
                Token::Date,
                Token::RBrace
            ]
        );
        assert_eq!(kinds("@@"), vec![Token::AtTotal]);
        assert_eq!(kinds("@"), vec![Token::AtUnit]);
        assert_eq!(kinds("="), vec![Token::Equal]);
        assert_eq!(kinds("|"), vec![Token::Pipe]);
    }

    #[test]
    fn unterminated_string_is_flagged() {
        assert_eq!(kinds("\"no closing quote"), vec![Token::UnterminatedString]);
    }

    #[test]
    fn unknown_text_yields_error_token() {
        let tokens = kinds("~ 2015-01-01");
        assert_eq!(tokens.first(), Some(&Token::Error));
        assert_eq!(tokens.last(), Some(&Token::Date));
    }

    #[test]
    fn tracks_line_numbers() {
        let mut lexer = Lexer::new("\n\n2015-01-01", Arc::new("t".to_string()));
        for _ in 0..2 {
            assert_eq!(lexer.peek().map(|(token, _)| token), Ok(Token::Eol));
            lexer.consume();
        }
        assert_eq!(lexer.location(), (3, 1).into());
        assert_eq!(lexer.peek().map(|(token, _)| token), Ok(Token::Date));
    }
}
