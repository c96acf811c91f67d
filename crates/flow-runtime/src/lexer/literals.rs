//! Literal and word scanning for the lexer

use crate::diagnostic::error_codes;
use crate::lexer::{is_identifier_char, is_identifier_start, Lexer};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::value::FlowError;
use std::rc::Rc;

impl Lexer {
    /// Scan a string literal opened by `quote`
    pub(super) fn string(&mut self, quote: char) -> Result<Token, FlowError> {
        self.check_closed_with_code(
            self.start_pos,
            error_codes::UNTERMINATED_STRING,
            "string literal must close",
            &format!("add a closing {}", quote),
        )?;
        self.advance(); // opening quote

        let mut value = String::new();
        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                let escape_start = self.current;
                self.advance();
                let escape_char = self.peek();
                let escaped = match escape_char {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    c if self.settings.symbols().quotes.contains(&c) => c,
                    _ => {
                        let span = Span::new(escape_start, self.current + 1);
                        let diagnostic = self
                            .diagnostic(
                                error_codes::INVALID_ESCAPE,
                                format!("invalid escape sequence '\\{}'", escape_char),
                                span,
                            )
                            .with_help("valid escapes are \\n \\t \\r \\\\ and an escaped quote");
                        return Err(FlowError::syntax(diagnostic, span));
                    }
                };
                self.advance();
                value.push(escaped);
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            let span = Span::new(self.start_pos, self.start_pos + 1);
            return Err(FlowError::syntax(
                self.diagnostic(error_codes::UNTERMINATED_STRING, "string literal must close", span),
                span,
            ));
        }
        self.advance(); // closing quote

        Ok(self.make_token(TokenKind::String, value))
    }

    /// Scan an Integer or Float literal using the active decimal separator
    pub(super) fn number(&mut self) -> Result<Token, FlowError> {
        let separator = self.settings.decimal_separator();
        let mut is_float = false;

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == separator && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }

            if self.peek() == separator && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
                let span = Span::new(self.current, self.current + 1);
                let diagnostic = self
                    .diagnostic(
                        error_codes::MALFORMED_NUMBER,
                        "a number can only have one decimal separator",
                        span,
                    )
                    .with_label("second separator");
                return Err(FlowError::syntax(diagnostic, span));
            }
        }

        if !self.is_at_end() && is_identifier_start(self.peek()) {
            let span = Span::new(self.start_pos, self.current + 1);
            return Err(FlowError::syntax(
                self.diagnostic(
                    error_codes::MALFORMED_NUMBER,
                    "a number cannot be followed directly by a name",
                    span,
                ),
                span,
            ));
        }

        let lexeme: String = self.chars[self.start_pos..self.current].iter().collect();
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        };
        Ok(self.make_token(kind, lexeme))
    }

    /// Scan an identifier or keyword, including multi-word keyword phrases
    pub(super) fn identifier(&mut self) -> Token {
        while !self.is_at_end() && is_identifier_char(self.peek()) {
            self.advance();
        }
        let word: String = self.chars[self.start_pos..self.current].iter().collect();

        let settings = Rc::clone(&self.settings);
        for (words, role) in settings.phrases() {
            if words[0] != word {
                continue;
            }
            if let Some(end) = self.match_phrase_tail(self.current, &words[1..]) {
                self.current = end;
                return self.make_token(TokenKind::from_keyword(*role), words.join(" "));
            }
        }

        match settings.keyword_role(&word) {
            Some(role) => self.make_token(TokenKind::from_keyword(role), word),
            None => self.make_token(TokenKind::Identifier, word),
        }
    }

    /// End position of `rest` matched word by word from `pos`, each word
    /// preceded by exactly one space and the last not running into a
    /// longer identifier
    fn match_phrase_tail(&self, mut pos: usize, rest: &[String]) -> Option<usize> {
        for word in rest {
            if self.chars.get(pos) != Some(&' ') {
                return None;
            }
            pos += 1;
            for expected in word.chars() {
                if self.chars.get(pos) != Some(&expected) {
                    return None;
                }
                pos += 1;
            }
        }
        match self.chars.get(pos) {
            Some(c) if is_identifier_char(*c) => None,
            _ => Some(pos),
        }
    }

    /// Scan `@doc /* ... */`; the lexeme is the raw interior
    pub(super) fn doc_comment(&mut self) -> Result<Token, FlowError> {
        let marker_len = self.settings.symbols().doc_marker.chars().count();
        self.current += marker_len;
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }

        if !self.starts_with_at(self.current, "/*") {
            let span = Span::new(self.start_pos, self.start_pos + marker_len);
            let diagnostic = self
                .diagnostic(
                    error_codes::MALFORMED_DOC,
                    "documentation marker must be followed by '/*'",
                    span,
                )
                .with_help("write the documentation as /* ... */");
            return Err(FlowError::syntax(diagnostic, span));
        }

        self.check_closed_with_code(
            self.start_pos,
            error_codes::MALFORMED_DOC,
            "documentation comment must close",
            "add '*/'",
        )?;

        let body_start = self.current + 2;
        let body_end = match self.find_str(body_start, "*/") {
            Some(end) => end,
            None => {
                let span = Span::new(self.start_pos, self.start_pos + marker_len);
                return Err(FlowError::syntax(
                    self.diagnostic(error_codes::MALFORMED_DOC, "documentation comment must close", span),
                    span,
                ));
            }
        };
        let body: String = self.chars[body_start..body_end].iter().collect();
        self.current = body_end + 2;
        Ok(self.make_token(TokenKind::Doc, body))
    }

    /// Scan `~D[...]`; the lexeme is the verbatim bracket contents
    pub(super) fn datetime(&mut self) -> Result<Token, FlowError> {
        let bracket = self.start_pos + 2;
        self.check_closed_with_code(
            bracket,
            error_codes::MALFORMED_DATETIME,
            "datetime literal must close",
            "add a closing ']'",
        )?;
        self.current = bracket + 1;

        let content_start = self.current;
        while !self.is_at_end() && self.peek() != ']' {
            self.advance();
        }
        if self.is_at_end() {
            let span = Span::new(bracket, bracket + 1);
            return Err(FlowError::syntax(
                self.diagnostic(error_codes::MALFORMED_DATETIME, "datetime literal must close", span),
                span,
            ));
        }
        let content: String = self.chars[content_start..self.current].iter().collect();
        self.advance(); // ]
        Ok(self.make_token(TokenKind::DateTime, content))
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::{Token, TokenKind};
    use crate::value::FlowError;
    use flow_config::{Settings, SettingsLoader};
    use rstest::rstest;
    use std::rc::Rc;

    fn lex(source: &str) -> Result<Vec<Token>, FlowError> {
        Lexer::new(source, Rc::new(Settings::default())).tokenize()
    }

    fn first(source: &str) -> Token {
        lex(source).unwrap().remove(0)
    }

    #[rstest]
    #[case("42", TokenKind::Integer, "42")]
    #[case("3.14", TokenKind::Float, "3.14")]
    #[case("\"hi\"", TokenKind::String, "hi")]
    #[case("'single'", TokenKind::String, "single")]
    #[case("\"a\\nb\"", TokenKind::String, "a\nb")]
    #[case("\"say \\\"x\\\"\"", TokenKind::String, "say \"x\"")]
    #[case("~D[2024-01-31]", TokenKind::DateTime, "2024-01-31")]
    #[case("name_1", TokenKind::Identifier, "name_1")]
    fn test_literals(#[case] source: &str, #[case] kind: TokenKind, #[case] lexeme: &str) {
        let token = first(source);
        assert_eq!(token.kind, kind);
        assert_eq!(token.lexeme, lexeme);
    }

    #[test]
    fn test_multiline_string() {
        let token = first("\"line one\nline two\"");
        assert_eq!(token.lexeme, "line one\nline two");
    }

    #[test]
    fn test_integer_followed_by_attribute() {
        let kinds: Vec<TokenKind> = lex("1.x").unwrap().into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Integer,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_second_separator_rejected() {
        let err = lex("1.2.3").unwrap_err();
        assert_eq!(err.diagnostic.unwrap().code, "FL1005");
    }

    #[test]
    fn test_comma_decimal_separator() {
        let settings = SettingsLoader::new()
            .without_env()
            .load_from_str("[symbols]\ndecimal_separator = \",\"\nargument_separator = \";\"")
            .unwrap();
        let tokens = Lexer::new("f(1,5; 2)", Rc::new(settings)).tokenize().unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Float,
                TokenKind::Separator,
                TokenKind::Integer,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[2].lexeme, "1,5");
    }

    #[test]
    fn test_unterminated_string_reported_at_open_quote() {
        let err = lex("x = 1\ny = \"never closed").unwrap_err();
        let diagnostic = err.diagnostic.unwrap();
        assert_eq!(diagnostic.code, "FL1002");
        assert_eq!(diagnostic.line, 2);
        assert_eq!(diagnostic.column, 5);
    }

    #[test]
    fn test_invalid_escape() {
        let err = lex("\"bad \\q\"").unwrap_err();
        assert_eq!(err.diagnostic.unwrap().code, "FL1003");
    }

    #[test]
    fn test_doc_comment() {
        let tokens = lex("@doc /* Adds one.\n   Returns a number. */ x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Doc);
        assert_eq!(tokens[0].lexeme, " Adds one.\n   Returns a number. ");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_doc_comment_must_close() {
        let err = lex("@doc /* never ends").unwrap_err();
        assert_eq!(err.diagnostic.unwrap().code, "FL1006");
    }

    #[test]
    fn test_datetime_must_close() {
        let err = lex("~D[2024-01-31").unwrap_err();
        assert_eq!(err.diagnostic.unwrap().code, "FL1007");
    }
}
