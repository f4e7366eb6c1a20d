//! # Abstract Syntax Tree
//!
//! This module defines the tokens and the tree produced when an expression
//! string is parsed.
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, navigation, operators, collections)
//! - **[operators]** - Binary and unary operators, selection kinds
//!
//! ## Quick Start
//!
//! ```text
//! members.?[nationality == 'Serbian'].![name]
//! ```
//!
//! Selects the members whose nationality is Serbian and projects their names.
//!
//! ## Core Concepts
//!
//! ### Active object
//!
//! Unqualified names such as `name` resolve against the *active object*. At top
//! level that is the root object; inside `?[...]` and `![...]` it is the element
//! being visited, also reachable as `#this`. The root stays reachable as `#root`.
//!
//! ### Navigation
//!
//! - `a.b` - property `b` of `a`
//! - `a?.b` - same, but null when `a` is null
//! - `a[0]`, `a['key']` - indexing into lists, strings, maps, and objects
//! - `a.m(x)` - method call
//!
//! ### References
//!
//! - `#name` - context variable; `#fn(x)` - registered function
//! - `@name` - bean reference
//! - `T(Name)` - type reference, used for static members and `instanceof`
//!
//! ### Collections
//!
//! - `{1, 2, 3}` - inline list, `{k: v}` - inline map, `{:}` - empty map
//! - `new int[3]`, `new int[]{1, 2}` - arrays
//! - `?[p]`, `^[p]`, `$[p]` - select all / first / last
//! - `![e]` - project
//!
//! ## Examples
//!
//! ```text
//! 'Hello world'.concat('!')
//! #primes.?[#this > 10]
//! placeOfBirth?.city ?: 'unknown'
//! 1 between {0, 2}
//! name = 'Nikola Tesla'
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::Expr;
pub use operators::{BinOp, SelectionKind, UnaryOp};
pub use tokens::{Token, TokenCategory};
