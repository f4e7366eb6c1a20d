use spel_lite::parser::{DEFAULT_MAX_DEPTH, parse, parse_template};
use spel_lite::{BinOp, Expr, Lexer, ParseError, Parser, Position, SelectionKind, TemplateContext, UnaryOp};

fn rendered(source: &str) -> String {
    parse(source).unwrap().to_string()
}

fn property(name: &str) -> Expr {
    Expr::Property {
        object: None,
        name: name.to_string(),
        null_safe: false,
    }
}

#[test]
fn test_literals() {
    assert_eq!(parse("42").unwrap(), Expr::Integer(42));
    assert_eq!(parse("1.5").unwrap(), Expr::Float(1.5));
    assert_eq!(parse("'hi'").unwrap(), Expr::String("hi".to_string()));
    assert_eq!(parse("true").unwrap(), Expr::Boolean(true));
    assert_eq!(parse("null").unwrap(), Expr::Null);
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    assert_eq!(rendered("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(rendered("(1 + 2) * 3"), "((1 + 2) * 3)");
}

#[test]
fn test_arithmetic_is_left_associative() {
    assert_eq!(rendered("10 - 4 - 3"), "((10 - 4) - 3)");
    assert_eq!(rendered("8 / 4 / 2"), "((8 / 4) / 2)");
}

#[test]
fn test_power_is_right_associative() {
    assert_eq!(rendered("2 ^ 3 ^ 2"), "(2 ^ (3 ^ 2))");
}

#[test]
fn test_unary_minus_applies_after_power() {
    let expr = parse("-2 ^ 2").unwrap();
    let Expr::UnaryOp { op, operand } = expr else {
        panic!("expected a unary operation");
    };
    assert_eq!(op, UnaryOp::Negate);
    assert!(matches!(*operand, Expr::BinaryOp { op: BinOp::Power, .. }));
}

#[test]
fn test_logical_precedence() {
    assert_eq!(rendered("a or b and c"), "(a or (b and c))");
    assert_eq!(rendered("not a and b"), "(!(a) and b)");
}

#[test]
fn test_relational_below_range_operators() {
    assert_eq!(rendered("x between {1, 2} == true"), "((x between {1, 2}) == true)");
    assert_eq!(rendered("1 + 1 between {0, 2}"), "((1 + 1) between {0, 2})");
}

#[test]
fn test_textual_operators_match_symbols() {
    assert_eq!(parse("a lt b").unwrap(), parse("a < b").unwrap());
    assert_eq!(parse("a ne b").unwrap(), parse("a != b").unwrap());
    assert_eq!(parse("a div b").unwrap(), parse("a / b").unwrap());
    assert_eq!(parse("a mod b").unwrap(), parse("a % b").unwrap());
    assert_eq!(parse("a && b").unwrap(), parse("a and b").unwrap());
}

#[test]
fn test_ternary_is_right_associative() {
    assert_eq!(rendered("a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
}

#[test]
fn test_elvis() {
    let expr = parse("name ?: 'Unknown'").unwrap();
    assert_eq!(
        expr,
        Expr::Elvis {
            left: Box::new(property("name")),
            right: Box::new(Expr::String("Unknown".to_string())),
        }
    );
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(rendered("#a = #b = 1"), "(#a = (#b = 1))");
}

#[test]
fn test_assignment_to_literal_is_rejected() {
    let err = parse("1 = 2").unwrap_err();
    assert_eq!(err, ParseError::NotAssignable { position: Position::new(0) });
}

#[test]
fn test_property_chain() {
    let expr = parse("placeOfBirth.city").unwrap();
    assert_eq!(
        expr,
        Expr::Property {
            object: Some(Box::new(property("placeOfBirth"))),
            name: "city".to_string(),
            null_safe: false,
        }
    );
}

#[test]
fn test_safe_navigation() {
    let expr = parse("placeOfBirth?.city").unwrap();
    assert!(matches!(expr, Expr::Property { null_safe: true, .. }));
    assert_eq!(expr.to_string(), "placeOfBirth?.city");
}

#[test]
fn test_safe_index() {
    let expr = parse("inventions?.[0]").unwrap();
    assert!(matches!(expr, Expr::Index { null_safe: true, .. }));
}

#[test]
fn test_keyword_as_member_name() {
    let expr = parse("#config.new").unwrap();
    assert!(matches!(expr, Expr::Property { ref name, .. } if name == "new"));
}

#[test]
fn test_method_calls() {
    let expr = parse("'abc'.substring(1, 2)").unwrap();
    assert_eq!(
        expr,
        Expr::MethodCall {
            object: Some(Box::new(Expr::String("abc".to_string()))),
            method: "substring".to_string(),
            args: vec![Expr::Integer(1), Expr::Integer(2)],
            null_safe: false,
        }
    );
    assert!(matches!(
        parse("isMember('Mihajlo Pupin')").unwrap(),
        Expr::MethodCall { object: None, .. }
    ));
}

#[test]
fn test_indexing() {
    assert_eq!(rendered("inventions[3]"), "inventions[3]");
    assert_eq!(rendered("officers['president'].name"), "officers['president'].name");
    assert_eq!(rendered("[0]"), "[0]");
}

#[test]
fn test_references() {
    assert_eq!(parse("#root").unwrap(), Expr::Root);
    assert_eq!(parse("#this").unwrap(), Expr::This);
    assert_eq!(parse("#primes").unwrap(), Expr::Variable("primes".to_string()));
    assert_eq!(parse("@config").unwrap(), Expr::BeanRef("config".to_string()));
    assert_eq!(parse("@'my bean'").unwrap(), Expr::BeanRef("my bean".to_string()));
    assert_eq!(
        parse("#reverse('abc')").unwrap(),
        Expr::FunctionCall {
            name: "reverse".to_string(),
            args: vec![Expr::String("abc".to_string())],
        }
    );
}

#[test]
fn test_type_references() {
    assert_eq!(parse("T(java.lang.Math)").unwrap(), Expr::TypeRef("java.lang.Math".to_string()));
    assert_eq!(rendered("T(Math).PI"), "T(Math).PI");
}

#[test]
fn test_inline_collections() {
    assert_eq!(
        parse("{1, 2, 3}").unwrap(),
        Expr::List(vec![Expr::Integer(1), Expr::Integer(2), Expr::Integer(3)])
    );
    assert_eq!(parse("{}").unwrap(), Expr::List(vec![]));
    assert_eq!(parse("{:}").unwrap(), Expr::Map(vec![]));
    assert!(matches!(parse("{{1}, {2, 3}}").unwrap(), Expr::List(items) if items.len() == 2));
}

#[test]
fn test_bare_map_keys_are_strings() {
    let expr = parse("{name: 'Nikola', 'dob': '10-July-1856'}").unwrap();
    let Expr::Map(pairs) = expr else {
        panic!("expected an inline map");
    };
    assert_eq!(pairs[0].0, Expr::String("name".to_string()));
    assert_eq!(pairs[1].0, Expr::String("dob".to_string()));
}

#[test]
fn test_constructors() {
    assert_eq!(
        parse("new Inventor('Albert Einstein', 'German')").unwrap(),
        Expr::Constructor {
            type_name: "Inventor".to_string(),
            args: vec![
                Expr::String("Albert Einstein".to_string()),
                Expr::String("German".to_string()),
            ],
        }
    );
}

#[test]
fn test_arrays() {
    assert!(matches!(
        parse("new int[4]").unwrap(),
        Expr::NewArray { size: Some(_), initializer: None, .. }
    ));
    assert!(matches!(
        parse("new int[]{1, 2, 3}").unwrap(),
        Expr::NewArray { size: None, initializer: Some(ref items), .. } if items.len() == 3
    ));
    assert!(parse("new int[]").is_err());
    assert!(parse("new int[2]{1, 2}").is_err());
}

#[test]
fn test_selection_and_projection() {
    let expr = parse("members.?[nationality == 'Serbian'].![name]").unwrap();
    let Expr::Projection { object, .. } = expr else {
        panic!("expected a projection");
    };
    assert!(matches!(*object, Expr::Selection { kind: SelectionKind::All, .. }));

    assert!(matches!(parse("list.^[#this > 1]").unwrap(), Expr::Selection { kind: SelectionKind::First, .. }));
    assert!(matches!(parse("list.$[#this > 1]").unwrap(), Expr::Selection { kind: SelectionKind::Last, .. }));
}

#[test]
fn test_unexpected_token_reports_position() {
    let err = parse("1 + * 2").unwrap_err();
    let ParseError::UnexpectedToken { found, position, .. } = &err else {
        panic!("expected an unexpected-token error, got {:?}", err);
    };
    assert_eq!(found, "'*'");
    assert_eq!(*position, Position::new(4));
}

#[test]
fn test_trailing_input_is_rejected() {
    assert!(matches!(parse("1 2"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse("(1"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse(""), Err(ParseError::UnexpectedToken { .. })));
}

#[test]
fn test_lex_errors_surface_through_parser() {
    assert!(matches!(parse("'open"), Err(ParseError::Lex(_))));
}

#[test]
fn test_depth_limit() {
    let source = format!("{}1{}", "(".repeat(400), ")".repeat(400));
    assert!(matches!(parse(&source), Err(ParseError::TooDeep { .. })));

    let shallow = Parser::new(Lexer::new("((1))")).unwrap().with_max_depth(2).parse();
    assert!(matches!(shallow, Err(ParseError::TooDeep { limit: 2, .. })));
}

#[test]
fn test_long_chains_count_toward_depth() {
    let source = vec!["1"; 400].join(" + ");
    assert!(matches!(parse(&source), Err(ParseError::TooDeep { .. })));
}

fn nested_sums(levels: usize) -> String {
    let mut source = "1".to_string();
    for _ in 0..levels {
        source = format!("(1 + {} * 2 - a.b[0])", source);
    }
    source
}

#[test]
fn test_accepted_trees_stay_within_depth_limit() {
    for size in [1, 10, 40, 60, 100, 127, 128, 129, 200, 1000] {
        let sources = [
            vec!["1"; size].join(" + "),
            vec!["x"; size].join(" or "),
            format!("a{}", ".b".repeat(size)),
            format!("a{}", "[0]".repeat(size)),
            format!("{}1", "-".repeat(size)),
            format!("2{}", " ^ 2".repeat(size)),
            format!("{}1{}", "(".repeat(size), ")".repeat(size)),
            format!("{}1{}", "{".repeat(size), "}".repeat(size)),
            nested_sums(size),
        ];
        for source in sources {
            match parse(&source) {
                Ok(expr) => assert!(
                    expr.depth() <= DEFAULT_MAX_DEPTH,
                    "{} chars parsed to depth {}",
                    source.len(),
                    expr.depth()
                ),
                Err(ParseError::TooDeep { limit, .. }) => assert_eq!(limit, DEFAULT_MAX_DEPTH),
                Err(other) => panic!("unexpected error for {} chars: {}", source.len(), other),
            }
        }
    }
}

#[test]
fn test_depth_limit_is_configurable() {
    let source = nested_sums(3);
    let tree = parse(&source).unwrap();
    assert!(Parser::new(Lexer::new(&source)).unwrap().with_max_depth(tree.depth()).parse().is_ok());
    assert!(matches!(
        Parser::new(Lexer::new(&source)).unwrap().with_max_depth(tree.depth() - 1).parse(),
        Err(ParseError::TooDeep { .. })
    ));
}

#[test]
fn test_moderate_nesting_is_accepted() {
    assert!(parse(&nested_sums(10)).is_ok());
    assert!(parse(&vec!["1"; 100].join(" * ")).is_ok());
    assert!(parse(&format!("a{}", ".b".repeat(100))).is_ok());
}

#[test]
fn test_t_names_a_function_or_method_after_a_prefix() {
    assert_eq!(
        parse("#T(1)").unwrap(),
        Expr::FunctionCall {
            name: "T".to_string(),
            args: vec![Expr::Integer(1)],
        }
    );
    assert!(matches!(
        parse("x.T()").unwrap(),
        Expr::MethodCall { ref method, .. } if method == "T"
    ));
    assert_eq!(parse("T(Math)").unwrap(), Expr::TypeRef("Math".to_string()));
}

#[test]
fn test_template_parts() {
    let expr = parse_template("Hello #{name}!", &TemplateContext::default(), DEFAULT_MAX_DEPTH).unwrap();
    assert_eq!(
        expr,
        Expr::Composite(vec![
            Expr::String("Hello ".to_string()),
            property("name"),
            Expr::String("!".to_string()),
        ])
    );
}

#[test]
fn test_template_without_expressions_is_a_literal() {
    let expr = parse_template("plain text", &TemplateContext::default(), DEFAULT_MAX_DEPTH).unwrap();
    assert_eq!(expr, Expr::String("plain text".to_string()));
}

#[test]
fn test_template_braces_inside_strings() {
    let expr = parse_template("[#{'}'}]", &TemplateContext::default(), DEFAULT_MAX_DEPTH).unwrap();
    assert_eq!(
        expr,
        Expr::Composite(vec![
            Expr::String("[".to_string()),
            Expr::String("}".to_string()),
            Expr::String("]".to_string()),
        ])
    );
}

#[test]
fn test_template_custom_delimiters() {
    let context = TemplateContext::new("${", "}");
    let expr = parse_template("a ${1 + 1} b", &context, DEFAULT_MAX_DEPTH).unwrap();
    assert!(matches!(expr, Expr::Composite(parts) if parts.len() == 3));
}

#[test]
fn test_template_errors() {
    let ctx = TemplateContext::default();
    assert_eq!(
        parse_template("abc #{name", &ctx, DEFAULT_MAX_DEPTH).unwrap_err(),
        ParseError::UnterminatedTemplate { position: Position::new(4) }
    );
    assert_eq!(
        parse_template("#{ }", &ctx, DEFAULT_MAX_DEPTH).unwrap_err(),
        ParseError::EmptyTemplate { position: Position::new(0) }
    );
}

#[test]
fn test_template_error_positions_are_absolute() {
    let err = parse_template("xy #{1 +}", &TemplateContext::default(), DEFAULT_MAX_DEPTH).unwrap_err();
    assert_eq!(err.position(), Position::new(8));
}

#[test]
fn test_rendered_source_reparses() {
    for source in [
        "members.?[nationality == 'Serbian'].![name]",
        "T(Math).max(1, 2) > 1 ? 'It''s big' : #x ?: null",
        "new int[]{1, 2}[0]",
        "{a: {1, 2}, 'b c': -1.5}",
        "!(#a and #b) or placeOfBirth?.city matches '[A-Z].*'",
    ] {
        let first = parse(source).unwrap();
        let second = parse(&first.to_string()).unwrap();
        assert_eq!(first, second, "round trip of {}", source);
    }
}
