use std::fmt;

use thiserror::Error;

use crate::ast::Token;

/// Character offset into the expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub offset: usize,
}

impl Position {
    pub fn new(offset: usize) -> Self {
        Position { offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {}", self.offset)
    }
}

/// A token together with the source text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    pub position: Position,
}

/// Errors raised while splitting an expression into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string literal starting at {position}")]
    UnterminatedString { position: Position },

    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: Position },

    #[error("malformed number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedString { position }
            | LexError::UnexpectedCharacter { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    /// Set after `.`, `?.`, `#` and `@`, where `T(` names a member, not a type.
    member_position: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            member_position: false,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = Position::new(self.position);
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            if ch == quote {
                if self.peek_char(1) == Some(quote) {
                    // doubled quote is an escaped quote
                    result.push(quote);
                    self.advance();
                    self.advance();
                    continue;
                }
                self.advance();
                return Ok(result);
            }
            result.push(ch);
            self.advance();
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;

        if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            self.advance();
            self.advance();
            let mut digits = String::new();
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_hexdigit() {
                    digits.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            if matches!(self.current_char(), Some('l' | 'L')) {
                self.advance();
            }
            return i64::from_str_radix(&digits, 16)
                .map(Token::Integer)
                .map_err(|_| self.invalid_number(start));
        }

        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !is_float && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(e @ ('e' | 'E')) = self.current_char() {
            let signed = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                number.push(e);
                self.advance();
                if signed {
                    number.extend(self.current_char());
                    self.advance();
                }
                while let Some(ch) = self.current_char() {
                    if !ch.is_ascii_digit() {
                        break;
                    }
                    number.push(ch);
                    self.advance();
                }
            }
        }

        match self.current_char() {
            Some('l' | 'L') => {
                self.advance();
                if is_float {
                    return Err(self.invalid_number(start));
                }
            }
            Some('f' | 'F' | 'd' | 'D') => {
                self.advance();
                is_float = true;
            }
            _ => {}
        }

        if self
            .current_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
            return Err(self.invalid_number(start));
        }

        if is_float {
            number.parse::<f64>().map(Token::Float).map_err(|_| self.invalid_number(start))
        } else {
            number.parse::<i64>().map(Token::Integer).map_err(|_| self.invalid_number(start))
        }
    }

    fn invalid_number(&self, start: usize) -> LexError {
        LexError::InvalidNumber {
            text: self.input[start..self.position].iter().collect(),
            position: Position::new(start),
        }
    }

    fn keyword(ident: &str) -> Option<Token> {
        let token = match ident.to_ascii_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "eq" => Token::EqEq,
            "ne" => Token::NotEq,
            "lt" => Token::Lt,
            "gt" => Token::Gt,
            "le" => Token::LtEq,
            "ge" => Token::GtEq,
            "div" => Token::Slash,
            "mod" => Token::Percent,
            "between" => Token::Between,
            "matches" => Token::Matches,
            "instanceof" => Token::InstanceOf,
            "new" => Token::New,
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            _ => return None,
        };
        Some(token)
    }

    /// Consumes `width` characters and yields `token`.
    fn single(&mut self, width: usize, token: Token) -> Result<Token, LexError> {
        self.position += width;
        Ok(token)
    }

    fn read_token(&mut self) -> Result<Token, LexError> {
        let next = self.peek_char(1);
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('+') => self.single(1, Token::Plus),
            Some('-') => self.single(1, Token::Minus),
            Some('*') => self.single(1, Token::Star),
            Some('/') => self.single(1, Token::Slash),
            Some('%') => self.single(1, Token::Percent),
            Some('^') if next == Some('[') => self.single(2, Token::SelectFirst),
            Some('^') => self.single(1, Token::Caret),
            Some('$') if next == Some('[') => self.single(2, Token::SelectLast),
            Some('!') if next == Some('=') => self.single(2, Token::NotEq),
            Some('!') if next == Some('[') => self.single(2, Token::Project),
            Some('!') => self.single(1, Token::Not),
            Some('?') if next == Some('[') => self.single(2, Token::Select),
            Some('?') if next == Some('.') => self.single(2, Token::SafeNav),
            Some('?') if next == Some(':') => self.single(2, Token::Elvis),
            Some('?') => self.single(1, Token::Question),
            Some('=') if next == Some('=') => self.single(2, Token::EqEq),
            Some('=') => self.single(1, Token::Assign),
            Some('<') if next == Some('=') => self.single(2, Token::LtEq),
            Some('<') => self.single(1, Token::Lt),
            Some('>') if next == Some('=') => self.single(2, Token::GtEq),
            Some('>') => self.single(1, Token::Gt),
            Some('&') if next == Some('&') => self.single(2, Token::And),
            Some('|') if next == Some('|') => self.single(2, Token::Or),
            Some('#') => self.single(1, Token::Hash),
            Some('@') => self.single(1, Token::At),
            Some('(') => self.single(1, Token::LParen),
            Some(')') => self.single(1, Token::RParen),
            Some('[') => self.single(1, Token::LBracket),
            Some(']') => self.single(1, Token::RBracket),
            Some('{') => self.single(1, Token::LBrace),
            Some('}') => self.single(1, Token::RBrace),
            Some('.') => self.single(1, Token::Dot),
            Some(',') => self.single(1, Token::Comma),
            Some(':') => self.single(1, Token::Colon),
            Some(quote @ ('\'' | '"')) => self.read_string(quote).map(Token::String),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some('T') if next == Some('(') && !self.member_position => self.single(2, Token::TypeRef),
            Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '$' => {
                let ident = self.read_identifier();
                Ok(Self::keyword(&ident).unwrap_or(Token::Identifier(ident)))
            }
            Some(ch) => Err(LexError::UnexpectedCharacter {
                ch,
                position: Position::new(self.position),
            }),
        }
    }

    /// Reads the next token along with its source text and position.
    pub fn next_spanned(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();
        let start = self.position;
        let token = self.read_token()?;
        self.member_position = matches!(token, Token::Dot | Token::SafeNav | Token::Hash | Token::At);
        Ok(Spanned {
            token,
            text: self.input[start..self.position].iter().collect(),
            position: Position::new(start),
        })
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.next_spanned().map(|spanned| spanned.token)
    }

    /// Splits the whole input into tokens, ending with [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_spanned()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, LexError> {
    Lexer::new(source).tokenize()
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and OR not eq div MOD between matches instanceof new true null");
    assert_eq!(lexer.next_token().unwrap(), Token::And);
    assert_eq!(lexer.next_token().unwrap(), Token::Or);
    assert_eq!(lexer.next_token().unwrap(), Token::Not);
    assert_eq!(lexer.next_token().unwrap(), Token::EqEq);
    assert_eq!(lexer.next_token().unwrap(), Token::Slash);
    assert_eq!(lexer.next_token().unwrap(), Token::Percent);
    assert_eq!(lexer.next_token().unwrap(), Token::Between);
    assert_eq!(lexer.next_token().unwrap(), Token::Matches);
    assert_eq!(lexer.next_token().unwrap(), Token::InstanceOf);
    assert_eq!(lexer.next_token().unwrap(), Token::New);
    assert_eq!(lexer.next_token().unwrap(), Token::Boolean(true));
    assert_eq!(lexer.next_token().unwrap(), Token::Null);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_selection() {
    let mut lexer = Lexer::new("#primes.?[#this > 10]");
    assert_eq!(lexer.next_token().unwrap(), Token::Hash);
    assert_eq!(lexer.next_token().unwrap(), Token::Identifier("primes".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Dot);
    assert_eq!(lexer.next_token().unwrap(), Token::Select);
    assert_eq!(lexer.next_token().unwrap(), Token::Hash);
    assert_eq!(lexer.next_token().unwrap(), Token::Identifier("this".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Gt);
    assert_eq!(lexer.next_token().unwrap(), Token::Integer(10));
    assert_eq!(lexer.next_token().unwrap(), Token::RBracket);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}
