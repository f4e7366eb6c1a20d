use std::mem;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, SelectionKind, Token, UnaryOp},
    lexer::{LexError, Lexer, Position, Spanned},
};

/// Deepest expression tree the parser accepts unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Errors raised while turning source text into an [`Expr`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected {found} at {position}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        position: Position,
    },

    #[error("left side of assignment at {position} is not assignable")]
    NotAssignable { position: Position },

    #[error("expression is nested deeper than {limit} at {position}")]
    TooDeep { limit: usize, position: Position },

    #[error("template expression starting at {position} is never closed")]
    UnterminatedTemplate { position: Position },

    #[error("empty template expression at {position}")]
    EmptyTemplate { position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(err) => err.position(),
            ParseError::UnexpectedToken { position, .. }
            | ParseError::NotAssignable { position }
            | ParseError::TooDeep { position, .. }
            | ParseError::UnterminatedTemplate { position }
            | ParseError::EmptyTemplate { position } => *position,
        }
    }

    /// Moves reported positions by `offset`, for errors inside a template.
    fn shifted(self, offset: usize) -> Self {
        let shift = |p: Position| Position::new(p.offset + offset);
        match self {
            ParseError::Lex(LexError::UnterminatedString { position }) => {
                ParseError::Lex(LexError::UnterminatedString { position: shift(position) })
            }
            ParseError::Lex(LexError::UnexpectedCharacter { ch, position }) => {
                ParseError::Lex(LexError::UnexpectedCharacter {
                    ch,
                    position: shift(position),
                })
            }
            ParseError::Lex(LexError::InvalidNumber { text, position }) => {
                ParseError::Lex(LexError::InvalidNumber {
                    text,
                    position: shift(position),
                })
            }
            ParseError::UnexpectedToken {
                found,
                expected,
                position,
            } => ParseError::UnexpectedToken {
                found,
                expected,
                position: shift(position),
            },
            ParseError::NotAssignable { position } => ParseError::NotAssignable {
                position: shift(position),
            },
            ParseError::TooDeep { limit, position } => ParseError::TooDeep {
                limit,
                position: shift(position),
            },
            ParseError::UnterminatedTemplate { position } => ParseError::UnterminatedTemplate {
                position: shift(position),
            },
            ParseError::EmptyTemplate { position } => ParseError::EmptyTemplate {
                position: shift(position),
            },
        }
    }
}

/// Recursive-descent parser, lowest precedence first:
///
/// ```text
/// expression   := binary ('?' expression ':' expression | '?:' expression)? ('=' expression)?
/// binary       := unary (binop unary)*        operator-precedence, left associative
///                 or < and < relational < between/matches/instanceof < + - < * / %
/// unary        := ('!' | '-' | '+')* postfix ('^' unary)?
/// postfix      := primary ('.' step | '?.' step | '[' expression ']')*
/// ```
///
/// Nesting of `expression` and the height of the resulting tree are both
/// bounded by `max_depth`.
pub struct Parser {
    lexer: Lexer,
    current: Spanned,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current = lexer.next_spanned()?;
        Ok(Parser {
            lexer,
            current,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn advance(&mut self) -> Result<Spanned, ParseError> {
        let next = self.lexer.next_spanned()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn position(&self) -> Position {
        self.current.position
    }

    fn unexpected<T>(&self, expected: &str) -> Result<T, ParseError> {
        let found = match &self.current.token {
            Token::Eof => "end of expression".to_string(),
            _ => format!("'{}'", self.current.text),
        };
        Err(ParseError::UnexpectedToken {
            found,
            expected: expected.to_string(),
            position: self.position(),
        })
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return self.unexpected(&format!("'{}'", expected));
        }
        self.advance()?;
        Ok(())
    }

    fn too_deep<T>(&self) -> Result<T, ParseError> {
        Err(ParseError::TooDeep {
            limit: self.max_depth,
            position: self.position(),
        })
    }

    /// Runs `rule` one nesting level down.
    fn nested(&mut self, rule: fn(&mut Self) -> Result<Expr, ParseError>) -> Result<Expr, ParseError> {
        if self.depth >= self.max_depth {
            return self.too_deep();
        }
        self.depth += 1;
        let expr = rule(self);
        self.depth -= 1;
        expr
    }

    /// Rejects trees taller than `max_depth`.
    fn bounded(&self, expr: Expr) -> Result<Expr, ParseError> {
        if expr.depth() > self.max_depth {
            return self.too_deep();
        }
        Ok(expr)
    }

    /// Parses a complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return self.unexpected("end of expression");
        }
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.nested(Self::parse_conditional)?;
        self.bounded(expr)
    }

    /// Ternary and Elvis, optionally followed by an assignment.
    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let start = self.position();
        let condition = self.parse_binary()?;
        let target = match self.current.token {
            Token::Question => {
                self.advance()?;
                let then_branch = self.parse_expression()?;
                self.expect(Token::Colon)?;
                let else_branch = self.parse_expression()?;
                Expr::Ternary {
                    condition: Box::new(condition),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                }
            }
            Token::Elvis => {
                self.advance()?;
                let right = self.parse_expression()?;
                Expr::Elvis {
                    left: Box::new(condition),
                    right: Box::new(right),
                }
            }
            _ => condition,
        };

        if !self.check(&Token::Assign) {
            return Ok(target);
        }
        if !target.is_assignable() {
            return Err(ParseError::NotAssignable { position: start });
        }
        self.advance()?;
        let value = self.parse_expression()?;
        Ok(Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// Parses binary operators below `^` with an explicit operator stack.
    fn parse_binary(&mut self) -> Result<Expr, ParseError> {
        let mut pending: Vec<(Expr, BinOp)> = Vec::new();
        let mut operand = self.parse_unary()?;
        while let Some(op) = binary_operator(&self.current.token) {
            while let Some((left, top)) = pending.pop_if(|(_, top)| top.precedence() >= op.precedence()) {
                operand = self.combine(left, top, operand)?;
            }
            pending.push((operand, op));
            self.advance()?;
            operand = self.parse_unary()?;
        }
        while let Some((left, op)) = pending.pop() {
            operand = self.combine(left, op, operand)?;
        }
        Ok(operand)
    }

    fn combine(&self, left: Expr, op: BinOp, right: Expr) -> Result<Expr, ParseError> {
        self.bounded(Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `^` binds tighter than the prefix operators and associates to the right.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let mut prefixes = Vec::new();
        loop {
            let op = match self.current.token {
                Token::Not => UnaryOp::Not,
                Token::Minus => UnaryOp::Negate,
                Token::Plus => UnaryOp::Plus,
                _ => break,
            };
            prefixes.push(op);
            self.advance()?;
        }

        let mut expr = self.parse_postfix()?;
        if self.check(&Token::Caret) {
            self.advance()?;
            let exponent = self.nested(Self::parse_unary)?;
            expr = self.combine(expr, BinOp::Power, exponent)?;
        }
        for op in prefixes.into_iter().rev() {
            expr = self.bounded(Expr::UnaryOp {
                op,
                operand: Box::new(expr),
            })?;
        }
        Ok(expr)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current.token {
                Token::Dot => {
                    self.advance()?;
                    expr = self.parse_navigation(expr, false)?;
                }
                Token::SafeNav => {
                    self.advance()?;
                    if self.check(&Token::LBracket) {
                        self.advance()?;
                        expr = self.parse_index(Some(expr), true)?;
                    } else {
                        expr = self.parse_navigation(expr, true)?;
                    }
                }
                Token::LBracket => {
                    self.advance()?;
                    expr = self.parse_index(Some(expr), false)?;
                }
                _ => return Ok(expr),
            }
            expr = self.bounded(expr)?;
        }
    }

    /// Parses `expr ]` after an opening bracket.
    fn parse_index(&mut self, object: Option<Expr>, null_safe: bool) -> Result<Expr, ParseError> {
        let index = self.parse_expression()?;
        self.expect(Token::RBracket)?;
        Ok(Expr::Index {
            object: object.map(Box::new),
            index: Box::new(index),
            null_safe,
        })
    }

    /// Parses the step after `.` or `?.`.
    fn parse_navigation(&mut self, object: Expr, null_safe: bool) -> Result<Expr, ParseError> {
        let kind = match self.current.token {
            Token::Select => Some(SelectionKind::All),
            Token::SelectFirst => Some(SelectionKind::First),
            Token::SelectLast => Some(SelectionKind::Last),
            _ => None,
        };
        if let Some(kind) = kind {
            self.advance()?;
            let predicate = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            return Ok(Expr::Selection {
                object: Box::new(object),
                kind,
                predicate: Box::new(predicate),
                null_safe,
            });
        }
        if self.check(&Token::Project) {
            self.advance()?;
            let projection = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            return Ok(Expr::Projection {
                object: Box::new(object),
                projection: Box::new(projection),
                null_safe,
            });
        }

        let Some(name) = self.member_name() else {
            return self.unexpected("property, method, selection or projection");
        };
        self.advance()?;
        if self.check(&Token::LParen) {
            let args = self.parse_args()?;
            return Ok(Expr::MethodCall {
                object: Some(Box::new(object)),
                method: name,
                args,
                null_safe,
            });
        }
        Ok(Expr::Property {
            object: Some(Box::new(object)),
            name,
            null_safe,
        })
    }

    /// A name after `.`; keywords such as `new` or `null` are plain names here.
    fn member_name(&self) -> Option<String> {
        if let Token::Identifier(name) = &self.current.token {
            return Some(name.clone());
        }
        let text = &self.current.text;
        let is_word = text.chars().next().is_some_and(char::is_alphabetic)
            && text.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
        let is_literal = matches!(
            self.current.token,
            Token::Integer(_) | Token::Float(_) | Token::String(_)
        );
        (is_word && !is_literal).then(|| text.clone())
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.check(&Token::RParen) {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            match self.current.token {
                Token::Comma => {
                    self.advance()?;
                }
                Token::RParen => {
                    self.advance()?;
                    return Ok(args);
                }
                _ => return self.unexpected("',' or ')'"),
            }
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String, ParseError> {
        let mut name = match &self.current.token {
            Token::Identifier(part) => part.clone(),
            _ => return self.unexpected("type name"),
        };
        self.advance()?;
        while self.check(&Token::Dot) {
            self.advance()?;
            match &self.current.token {
                Token::Identifier(part) => {
                    name.push('.');
                    name.push_str(part);
                }
                _ => return self.unexpected("type name"),
            }
            self.advance()?;
        }
        Ok(name)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let spanned = self.advance()?;
        match spanned.token {
            // Literals
            Token::Integer(n) => Ok(Expr::Integer(n)),
            Token::Float(n) => Ok(Expr::Float(n)),
            Token::String(s) => Ok(Expr::String(s)),
            Token::Boolean(b) => Ok(Expr::Boolean(b)),
            Token::Null => Ok(Expr::Null),

            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            Token::LBrace => self.parse_inline_collection(),

            Token::New => self.parse_construction(),

            Token::TypeRef => {
                let name = self.parse_qualified_name()?;
                self.expect(Token::RParen)?;
                Ok(Expr::TypeRef(name))
            }

            Token::Hash => {
                let name = match &self.current.token {
                    Token::Identifier(name) => name.clone(),
                    _ => return self.unexpected("variable name after '#'"),
                };
                self.advance()?;
                match name.as_str() {
                    "this" => Ok(Expr::This),
                    "root" => Ok(Expr::Root),
                    _ if self.check(&Token::LParen) => Ok(Expr::FunctionCall {
                        name,
                        args: self.parse_args()?,
                    }),
                    _ => Ok(Expr::Variable(name)),
                }
            }

            Token::At => {
                let name = match &self.current.token {
                    Token::Identifier(name) | Token::String(name) => name.clone(),
                    _ => return self.unexpected("bean name after '@'"),
                };
                self.advance()?;
                Ok(Expr::BeanRef(name))
            }

            Token::Identifier(name) => {
                if self.check(&Token::LParen) {
                    return Ok(Expr::MethodCall {
                        object: None,
                        method: name,
                        args: self.parse_args()?,
                        null_safe: false,
                    });
                }
                Ok(Expr::Property {
                    object: None,
                    name,
                    null_safe: false,
                })
            }

            // `[0]` indexes the active object
            Token::LBracket => self.parse_index(None, false),

            token => Err(ParseError::UnexpectedToken {
                found: match token {
                    Token::Eof => "end of expression".to_string(),
                    _ => format!("'{}'", spanned.text),
                },
                expected: "expression".to_string(),
                position: spanned.position,
            }),
        }
    }

    /// Parses `{}` lists, `{:}` and `{k: v}` maps after the opening brace.
    fn parse_inline_collection(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::RBrace) {
            self.advance()?;
            return Ok(Expr::List(Vec::new()));
        }
        if self.check(&Token::Colon) {
            self.advance()?;
            self.expect(Token::RBrace)?;
            return Ok(Expr::Map(Vec::new()));
        }

        let first = self.parse_expression()?;
        if !self.check(&Token::Colon) {
            let mut items = vec![first];
            while self.check(&Token::Comma) {
                self.advance()?;
                items.push(self.parse_expression()?);
            }
            self.expect(Token::RBrace)?;
            return Ok(Expr::List(items));
        }

        let mut pairs = Vec::new();
        let mut key = first;
        loop {
            self.expect(Token::Colon)?;
            let value = self.parse_expression()?;
            pairs.push((map_key(key), value));
            match self.current.token {
                Token::Comma => {
                    self.advance()?;
                    key = self.parse_expression()?;
                }
                Token::RBrace => {
                    self.advance()?;
                    return Ok(Expr::Map(pairs));
                }
                _ => return self.unexpected("',' or '}'"),
            }
        }
    }

    /// Parses `Name(args)`, `type[size]` or `type[]{items}` after `new`.
    fn parse_construction(&mut self) -> Result<Expr, ParseError> {
        let type_name = self.parse_qualified_name()?;
        if self.check(&Token::LParen) {
            return Ok(Expr::Constructor {
                type_name,
                args: self.parse_args()?,
            });
        }

        if !self.check(&Token::LBracket) {
            return self.unexpected("'(' or '['");
        }
        self.advance()?;
        let size = if self.check(&Token::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(Token::RBracket)?;

        let initializer = match (&size, self.check(&Token::LBrace)) {
            (None, true) => {
                self.advance()?;
                let mut items = Vec::new();
                if !self.check(&Token::RBrace) {
                    items.push(self.parse_expression()?);
                    while self.check(&Token::Comma) {
                        self.advance()?;
                        items.push(self.parse_expression()?);
                    }
                }
                self.expect(Token::RBrace)?;
                Some(items)
            }
            (None, false) => return self.unexpected("array size or initializer"),
            (Some(_), true) => return self.unexpected("no initializer after an array size"),
            (Some(_), false) => None,
        };

        Ok(Expr::NewArray {
            element_type: type_name,
            size,
            initializer,
        })
    }
}

/// Bare names used as map keys are literal strings: `{name: 'x'}`.
fn map_key(key: Expr) -> Expr {
    match key {
        Expr::Property {
            object: None,
            name,
            null_safe: false,
        } => Expr::String(name),
        other => other,
    }
}

fn binary_operator(token: &Token) -> Option<BinOp> {
    let op = match token {
        Token::Or => BinOp::Or,
        Token::And => BinOp::And,
        Token::EqEq => BinOp::Equal,
        Token::NotEq => BinOp::NotEqual,
        Token::Lt => BinOp::LessThan,
        Token::Gt => BinOp::GreaterThan,
        Token::LtEq => BinOp::LessEqual,
        Token::GtEq => BinOp::GreaterEqual,
        Token::Between => BinOp::Between,
        Token::Matches => BinOp::Matches,
        Token::InstanceOf => BinOp::InstanceOf,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Subtract,
        Token::Star => BinOp::Multiply,
        Token::Slash => BinOp::Divide,
        Token::Percent => BinOp::Modulo,
        _ => return None,
    };
    Some(op)
}

/// Parses a standalone expression with the default depth limit.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(source))?.parse()
}

/// Delimiters of embedded expressions in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pub prefix: String,
    pub suffix: String,
}

impl TemplateContext {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        TemplateContext {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl Default for TemplateContext {
    fn default() -> Self {
        TemplateContext::new("#{", "}")
    }
}

fn starts_with_at(chars: &[char], at: usize, pattern: &[char]) -> bool {
    chars.len() >= at + pattern.len() && chars[at..at + pattern.len()] == *pattern
}

/// Finds the suffix closing an embedded expression that starts at `start`,
/// skipping quoted strings and nested brackets.
fn find_suffix(chars: &[char], start: usize, suffix: &[char]) -> Option<usize> {
    let mut nesting = 0usize;
    let mut quote = None;
    let mut i = start;
    while i < chars.len() {
        let ch = chars[i];
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if nesting == 0 && starts_with_at(chars, i, suffix) {
            return Some(i);
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => nesting += 1,
            ')' | ']' | '}' => nesting = nesting.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parses a template where literal text surrounds `prefix expr suffix` parts.
///
/// Text with no embedded expressions parses to a plain string literal.
pub fn parse_template(source: &str, context: &TemplateContext, max_depth: usize) -> Result<Expr, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let prefix: Vec<char> = context.prefix.chars().collect();
    let suffix: Vec<char> = context.suffix.chars().collect();

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        if prefix.is_empty() || !starts_with_at(&chars, i, &prefix) {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        let open = i;
        let start = i + prefix.len();
        let end = find_suffix(&chars, start, &suffix)
            .ok_or(ParseError::UnterminatedTemplate { position: Position::new(open) })?;
        let inner: String = chars[start..end].iter().collect();
        if inner.trim().is_empty() {
            return Err(ParseError::EmptyTemplate {
                position: Position::new(open),
            });
        }

        let expr = Parser::new(Lexer::new(&inner))
            .and_then(|parser| parser.with_max_depth(max_depth).parse())
            .map_err(|e| e.shifted(start))?;
        if !literal.is_empty() {
            parts.push(Expr::String(mem::take(&mut literal)));
        }
        parts.push(expr);
        i = end + suffix.len();
    }
    if !literal.is_empty() || parts.is_empty() {
        parts.push(Expr::String(literal));
    }

    if parts.len() == 1 && matches!(parts[0], Expr::String(_)) {
        return Ok(parts.remove(0));
    }
    Ok(Expr::Composite(parts))
}

#[test]
fn test_precedence() {
    let expr = parse("1 + 2 * 3").unwrap();
    assert_eq!(expr.to_string(), "(1 + (2 * 3))");
}

#[test]
fn test_template_with_nested_braces() {
    let expr = parse_template("list: #{ {1, 2}.size() }!", &TemplateContext::default(), DEFAULT_MAX_DEPTH).unwrap();
    let Expr::Composite(parts) = expr else {
        panic!("expected a composite expression");
    };
    assert_eq!(parts.len(), 3);
}
