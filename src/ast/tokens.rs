use std::fmt;

/// Lexical token produced by the [`Lexer`](crate::lexer::Lexer).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer literal, decimal or hexadecimal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0xFF
    /// 7L
    /// ```
    Integer(i64),

    /// Floating-point literal
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 1e3
    /// 2.5d
    /// ```
    Float(f64),

    /// String literal in single or double quotes.
    ///
    /// A doubled quote character escapes the quote itself.
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// 'It''s'
    /// "say ""hi"""
    /// ```
    String(String),

    /// `true` / `false`
    Boolean(bool),

    /// `null`
    Null,

    // Identifiers and references
    /// Property, method, or type name segment
    ///
    /// # Examples
    /// ```text
    /// name
    /// placeOfBirth
    /// _internal
    /// ```
    Identifier(String),

    /// Variable prefix (`#primes`, `#this`, `#root`)
    Hash,

    /// Bean reference prefix (`@restClient`)
    At,

    /// Type reference opener, the keyword `T` directly followed by `(`
    TypeRef,

    /// Constructor keyword (`new`)
    New,

    // Arithmetic
    /// Addition or string concatenation
    Plus,
    /// Subtraction or character shift
    Minus,
    /// Multiplication or string repetition
    Star,
    /// Division (`/` or `div`)
    Slash,
    /// Modulo (`%` or `mod`)
    Percent,
    /// Power (`^`)
    Caret,

    // Relational
    /// `==` or `eq`
    EqEq,
    /// `!=` or `ne`
    NotEq,
    /// `<` or `lt`
    Lt,
    /// `>` or `gt`
    Gt,
    /// `<=` or `le`
    LtEq,
    /// `>=` or `ge`
    GtEq,
    /// `between`
    Between,
    /// `matches`
    Matches,
    /// `instanceof`
    InstanceOf,

    // Logical
    /// `and` or `&&`
    And,
    /// `or` or `||`
    Or,
    /// `not` or `!`
    Not,

    // Conditional and navigation
    /// Ternary condition marker (`?`)
    Question,
    /// Elvis operator (`?:`)
    Elvis,
    /// Safe navigation (`?.`)
    SafeNav,
    /// Assignment (`=`)
    Assign,

    // Collection operators
    /// Selection of all matches (`?[`)
    Select,
    /// Selection of the first match (`^[`)
    SelectFirst,
    /// Selection of the last match (`$[`)
    SelectLast,
    /// Projection (`![`)
    Project,

    // Delimiters
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// Left bracket for indexing and array sizes
    LBracket,
    /// Right bracket
    RBracket,
    /// Left brace for inline lists and maps
    LBrace,
    /// Right brace
    RBrace,
    /// Dot for property and method navigation
    Dot,
    /// Comma for arguments and collection elements
    Comma,
    /// Colon for map entries and the ternary else branch
    Colon,

    /// End of input
    Eof,
}

/// Coarse classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    Literal,
    Identifier,
    Operator,
    Punctuation,
}

impl Token {
    pub fn category(&self) -> TokenCategory {
        use Token::*;
        match self {
            Integer(_) | Float(_) | String(_) | Boolean(_) | Null => TokenCategory::Literal,
            Identifier(_) => TokenCategory::Identifier,
            LParen | RParen | LBracket | RBracket | LBrace | RBrace | Dot | Comma | Colon | Eof => {
                TokenCategory::Punctuation
            }
            _ => TokenCategory::Operator,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;
        match self {
            Integer(n) => write!(f, "{}", n),
            Float(n) => write!(f, "{:?}", n),
            String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Boolean(b) => write!(f, "{}", b),
            Null => f.write_str("null"),
            Identifier(name) => f.write_str(name),
            Hash => f.write_str("#"),
            At => f.write_str("@"),
            TypeRef => f.write_str("T("),
            New => f.write_str("new"),
            Plus => f.write_str("+"),
            Minus => f.write_str("-"),
            Star => f.write_str("*"),
            Slash => f.write_str("/"),
            Percent => f.write_str("%"),
            Caret => f.write_str("^"),
            EqEq => f.write_str("=="),
            NotEq => f.write_str("!="),
            Lt => f.write_str("<"),
            Gt => f.write_str(">"),
            LtEq => f.write_str("<="),
            GtEq => f.write_str(">="),
            Between => f.write_str("between"),
            Matches => f.write_str("matches"),
            InstanceOf => f.write_str("instanceof"),
            And => f.write_str("and"),
            Or => f.write_str("or"),
            Not => f.write_str("!"),
            Question => f.write_str("?"),
            Elvis => f.write_str("?:"),
            SafeNav => f.write_str("?."),
            Assign => f.write_str("="),
            Select => f.write_str("?["),
            SelectFirst => f.write_str("^["),
            SelectLast => f.write_str("$["),
            Project => f.write_str("!["),
            LParen => f.write_str("("),
            RParen => f.write_str(")"),
            LBracket => f.write_str("["),
            RBracket => f.write_str("]"),
            LBrace => f.write_str("{"),
            RBrace => f.write_str("}"),
            Dot => f.write_str("."),
            Comma => f.write_str(","),
            Colon => f.write_str(":"),
            Eof => f.write_str("end of input"),
        }
    }
}
