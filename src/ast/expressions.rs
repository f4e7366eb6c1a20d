use std::fmt;

use crate::ast::{BinOp, SelectionKind, UnaryOp};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Navigation nodes (`Property`, `Index`, `MethodCall`) carry an optional
/// receiver. A missing receiver means the name resolves against the active
/// object: the root at top level, the current element inside a selection or
/// projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 42.0
    /// ```
    Float(f64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// 'hello'
    /// ```
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    // References
    /// The root object (`#root`)
    Root,

    /// The active object (`#this`)
    This,

    /// Context variable (`#name`)
    Variable(String),

    /// Bean reference resolved through the context's bean resolver (`@name`)
    BeanRef(String),

    /// Type reference (`T(String)`)
    TypeRef(String),

    // Navigation
    /// Property access
    ///
    /// # Examples
    /// ```text
    /// name
    /// placeOfBirth.city
    /// placeOfBirth?.city
    /// ```
    Property {
        object: Option<Box<Expr>>,
        name: String,
        null_safe: bool,
    },

    /// Index access into lists, strings, maps, and objects
    ///
    /// # Examples
    /// ```text
    /// inventions[0]
    /// officers['president']
    /// #root['name']
    /// ```
    Index {
        object: Option<Box<Expr>>,
        index: Box<Expr>,
        null_safe: bool,
    },

    /// Method call
    ///
    /// # Examples
    /// ```text
    /// 'Hello'.concat('!')
    /// isMember('Marie Curie')
    /// ```
    MethodCall {
        object: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
        null_safe: bool,
    },

    /// Registered function call (`#reverse('abc')`)
    FunctionCall { name: String, args: Vec<Expr> },

    /// Object construction (`new Inventor('Nikola Tesla', 'Serbia')`)
    Constructor { type_name: String, args: Vec<Expr> },

    /// Array construction
    ///
    /// # Examples
    /// ```text
    /// new int[3]
    /// new int[]{1, 2, 3}
    /// ```
    NewArray {
        element_type: String,
        size: Option<Box<Expr>>,
        initializer: Option<Vec<Expr>>,
    },

    // Operations
    /// Binary operation (arithmetic, relational, logical, range)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary prefix operation
    UnaryOp { op: UnaryOp, operand: Box<Expr> },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// `left ?: right`
    Elvis { left: Box<Expr>, right: Box<Expr> },

    /// Assignment to a property, index, or variable
    Assign { target: Box<Expr>, value: Box<Expr> },

    // Collections
    /// Inline list (`{1, 2, 3}`)
    List(Vec<Expr>),

    /// Inline map (`{name: 'Nikola', country: 'Serbia'}`)
    Map(Vec<(Expr, Expr)>),

    /// Collection selection
    ///
    /// # Examples
    /// ```text
    /// #primes.?[#this > 10]
    /// members.^[nationality == 'Serbian']
    /// ```
    Selection {
        object: Box<Expr>,
        kind: SelectionKind,
        predicate: Box<Expr>,
        null_safe: bool,
    },

    /// Collection projection (`members.![name]`)
    Projection {
        object: Box<Expr>,
        projection: Box<Expr>,
        null_safe: bool,
    },

    /// Template made of literal text and embedded expressions
    ///
    /// Literal text parts are `Expr::String`.
    Composite(Vec<Expr>),
}

impl Expr {
    /// Whether the expression may appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Property { .. } | Expr::Index { .. } | Expr::Variable(_)
        )
    }

    /// Height of the tree; a literal has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().map(Expr::depth).max().unwrap_or(0)
    }

    /// Whether any node in the tree is an assignment.
    pub fn has_side_effects(&self) -> bool {
        matches!(self, Expr::Assign { .. }) || self.children().any(Expr::has_side_effects)
    }

    fn children(&self) -> Box<dyn Iterator<Item = &Expr> + '_> {
        match self {
            Expr::Integer(_)
            | Expr::Float(_)
            | Expr::String(_)
            | Expr::Boolean(_)
            | Expr::Null
            | Expr::Root
            | Expr::This
            | Expr::Variable(_)
            | Expr::BeanRef(_)
            | Expr::TypeRef(_) => Box::new(std::iter::empty()),
            Expr::Property { object, .. } => Box::new(object.iter().map(|o| o.as_ref())),
            Expr::Index { object, index, .. } => {
                Box::new(object.iter().map(|o| o.as_ref()).chain(std::iter::once(index.as_ref())))
            }
            Expr::MethodCall { object, args, .. } => {
                Box::new(object.iter().map(|o| o.as_ref()).chain(args.iter()))
            }
            Expr::FunctionCall { args, .. } | Expr::Constructor { args, .. } => Box::new(args.iter()),
            Expr::NewArray {
                size, initializer, ..
            } => Box::new(
                size.iter()
                    .map(|s| s.as_ref())
                    .chain(initializer.iter().flatten()),
            ),
            Expr::BinaryOp { left, right, .. } | Expr::Elvis { left, right } => {
                Box::new([left.as_ref(), right.as_ref()].into_iter())
            }
            Expr::Assign { target, value } => Box::new([target.as_ref(), value.as_ref()].into_iter()),
            Expr::UnaryOp { operand, .. } => Box::new(std::iter::once(operand.as_ref())),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => Box::new(
                [condition.as_ref(), then_branch.as_ref(), else_branch.as_ref()].into_iter(),
            ),
            Expr::List(items) | Expr::Composite(items) => Box::new(items.iter()),
            Expr::Map(pairs) => Box::new(pairs.iter().flat_map(|(k, v)| [k, v])),
            Expr::Selection {
                object, predicate, ..
            } => Box::new([object.as_ref(), predicate.as_ref()].into_iter()),
            Expr::Projection {
                object, projection, ..
            } => Box::new([object.as_ref(), projection.as_ref()].into_iter()),
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

fn write_receiver(f: &mut fmt::Formatter<'_>, object: &Option<Box<Expr>>, null_safe: bool) -> fmt::Result {
    if let Some(object) = object {
        write!(f, "{}{}", object, if null_safe { "?." } else { "." })?;
    }
    Ok(())
}

/// Renders the expression back to parseable source.
///
/// Binary, ternary, and assignment nodes are fully parenthesized so the
/// rendered text re-parses to an equivalent tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Float(n) => write!(f, "{:?}", n),
            Expr::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Null => f.write_str("null"),
            Expr::Root => f.write_str("#root"),
            Expr::This => f.write_str("#this"),
            Expr::Variable(name) => write!(f, "#{}", name),
            Expr::BeanRef(name) if is_plain_identifier(name) => write!(f, "@{}", name),
            Expr::BeanRef(name) => write!(f, "@'{}'", name.replace('\'', "''")),
            Expr::TypeRef(name) => write!(f, "T({})", name),
            Expr::Property {
                object,
                name,
                null_safe,
            } => {
                write_receiver(f, object, *null_safe)?;
                f.write_str(name)
            }
            Expr::Index {
                object,
                index,
                null_safe,
            } => {
                if let Some(object) = object {
                    write!(f, "{}", object)?;
                    if *null_safe {
                        f.write_str("?.")?;
                    }
                }
                write!(f, "[{}]", index)
            }
            Expr::MethodCall {
                object,
                method,
                args,
                null_safe,
            } => {
                write_receiver(f, object, *null_safe)?;
                write!(f, "{}(", method)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::FunctionCall { name, args } => {
                write!(f, "#{}(", name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::Constructor { type_name, args } => {
                write!(f, "new {}(", type_name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::NewArray {
                element_type,
                size,
                initializer,
            } => {
                write!(f, "new {}[", element_type)?;
                if let Some(size) = size {
                    write!(f, "{}", size)?;
                }
                f.write_str("]")?;
                if let Some(items) = initializer {
                    f.write_str("{")?;
                    write_args(f, items)?;
                    f.write_str("}")?;
                }
                Ok(())
            }
            Expr::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::UnaryOp { op, operand } => write!(f, "{}({})", op.symbol(), operand),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            Expr::Elvis { left, right } => write!(f, "({} ?: {})", left, right),
            Expr::Assign { target, value } => write!(f, "({} = {})", target, value),
            Expr::List(items) => {
                f.write_str("{")?;
                write_args(f, items)?;
                f.write_str("}")
            }
            Expr::Map(pairs) if pairs.is_empty() => f.write_str("{:}"),
            Expr::Map(pairs) => {
                f.write_str("{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                f.write_str("}")
            }
            Expr::Selection {
                object,
                kind,
                predicate,
                null_safe,
            } => write!(
                f,
                "{}{}{}{}]",
                object,
                if *null_safe { "?." } else { "." },
                kind.opener(),
                predicate
            ),
            Expr::Projection {
                object,
                projection,
                null_safe,
            } => write!(
                f,
                "{}{}![{}]",
                object,
                if *null_safe { "?." } else { "." },
                projection
            ),
            Expr::Composite(parts) => {
                for part in parts {
                    match part {
                        Expr::String(text) => f.write_str(text)?,
                        other => write!(f, "#{{{}}}", other)?,
                    }
                }
                Ok(())
            }
        }
    }
}
