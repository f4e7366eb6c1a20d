use spel_lite::inventor::{self, Inventor};
use spel_lite::{
    EvalErrorKind, EvaluationContext, ExpressionParser, HostObject, ParserConfig, Record, Value,
    ValueType, evaluate,
};

fn integers(items: &[i64]) -> Value {
    Value::list(items.iter().map(|n| Value::Integer(*n)).collect())
}

#[test]
fn test_inline_list_scenario() {
    assert_eq!(evaluate("{1, 2, 3}").unwrap(), integers(&[1, 2, 3]));
}

#[test]
fn test_selection_scenario() {
    let expr = ExpressionParser::new().parse_expression("#primes.?[#this > 10]").unwrap();
    let mut ctx = EvaluationContext::standard()
        .with_variable("primes", integers(&[2, 3, 5, 7, 11, 13, 17]))
        .build();
    assert_eq!(expr.get_value_in(&mut ctx).unwrap(), integers(&[11, 13, 17]));
}

#[test]
fn test_between_scenario() {
    assert_eq!(evaluate("1 between {0, 2}").unwrap(), Value::Boolean(true));
    assert_eq!(evaluate("1 between {2, 3}").unwrap(), Value::Boolean(false));
    assert_eq!(evaluate("'b' between {'a', 'c'}").unwrap(), Value::Boolean(true));
    assert!(evaluate("1 between {0}").is_err());
}

#[test]
fn test_assignment_scenario() {
    let root = Record::new("Member").with_field("name", "Kim").into_value();
    let mut ctx = EvaluationContext::standard().root(root.clone()).build();
    let expr = ExpressionParser::new().parse_expression("name = 'ohhoonim'").unwrap();

    assert_eq!(expr.get_value_in(&mut ctx).unwrap(), Value::from("ohhoonim"));
    let Value::Object(member) = root else {
        panic!("root should be an object");
    };
    assert_eq!(member.borrow().field("name"), Some(Value::from("ohhoonim")));
}

#[test]
fn test_literal_values_evaluate_to_themselves() {
    let cases = [
        ("5 * 2", Value::Integer(10)),
        ("'h' - 3", Value::from("e")),
        ("'Hello world'", Value::from("Hello world")),
        ("0x10", Value::Integer(16)),
        ("2.5", Value::Float(2.5)),
        ("'It''s'", Value::from("It's")),
        ("false", Value::Boolean(false)),
    ];
    for (source, expected) in cases {
        assert_eq!(evaluate(source).unwrap(), expected, "{}", source);
    }
}

#[test]
fn test_safe_navigation_on_null_root() {
    assert_eq!(evaluate("#root?.missingProp").unwrap(), Value::Null);
    assert_eq!(evaluate("#root?.missingProp?.deeper").unwrap(), Value::Null);
    assert_eq!(evaluate("#root?.['key']").unwrap(), Value::Null);
}

#[test]
fn test_evaluation_is_idempotent() {
    let expr = ExpressionParser::new()
        .parse_expression("members.?[nationality == 'Serbian'].![name + '!']")
        .unwrap();
    let root = Value::object(inventor::ieee());
    let first = expr.get_value_for(&root).unwrap();
    let second = expr.get_value_for(&root).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.items().map(|items| items.len()), Some(2));
}

#[test]
fn test_reparsing_rendered_expressions() {
    let parser = ExpressionParser::new();
    let sources = [
        "1 + 2 * 3 - 4 / 2",
        "(1 + 2) * 3",
        "2 ^ 3 ^ 2",
        "'a''b' + 'c'",
        "true and not false or 1 > 2",
        "{1, 2, 3}.![#this * 10]",
        "{a: 1, 'b c': 2}['b c']",
        "1 between {0, 2} ? 'in' : 'out'",
        "null ?: 'default'",
        "T(Math).max(3, 7) % 4",
        "'abc'.toUpperCase().substring(1)",
        "{1, 2, 3, 4}.?[#this % 2 == 0].size()",
        "new int[]{3, 4}[1]",
        "'xyz' matches '[a-z]+' and 1 instanceof T(Integer)",
        "-(2 - 5)",
    ];
    for source in sources {
        let original = parser.parse_expression(source).unwrap();
        let rendered = original.ast().to_string();
        let reparsed = parser
            .parse_expression(&rendered)
            .unwrap_or_else(|e| panic!("{} rendered as {} fails to parse: {}", source, rendered, e));
        assert_eq!(
            original.get_value().unwrap(),
            reparsed.get_value().unwrap(),
            "{} rendered as {}",
            source,
            rendered
        );
    }
}

#[test]
fn test_index_past_end_without_auto_grow() {
    let mut ctx = EvaluationContext::standard()
        .with_variable("list", Value::typed_list(ValueType::Integer, vec![Value::Integer(1)]))
        .build();
    let expr = ExpressionParser::new().parse_expression("#list[3]").unwrap();
    let err = expr.get_value_in(&mut ctx).unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::IndexOutOfBounds);
}

#[test]
fn test_index_past_end_with_auto_grow() {
    let list = Value::typed_list(ValueType::Integer, vec![Value::Integer(1)]);
    let mut ctx = EvaluationContext::standard()
        .with_variable("list", list.clone())
        .build();
    let parser = ExpressionParser::with_config(ParserConfig::new(false, true));

    let read = parser.parse_expression("#list[3]").unwrap();
    assert_eq!(read.get_value_in(&mut ctx).unwrap(), Value::Integer(0));
    assert_eq!(list.items().map(|items| items.len()), Some(4));

    let write = parser.parse_expression("#list[5] = 9").unwrap();
    write.get_value_in(&mut ctx).unwrap();
    assert_eq!(list.items().unwrap()[5], Value::Integer(9));
}

#[test]
fn test_auto_grow_respects_maximum_size() {
    let mut ctx = EvaluationContext::standard()
        .with_variable("list", Value::typed_list(ValueType::Integer, Vec::new()))
        .build();
    let config = ParserConfig::new(false, true).with_maximum_auto_grow_size(3);
    let parser = ExpressionParser::with_config(config);

    assert!(parser.parse_expression("#list[2]").unwrap().get_value_in(&mut ctx).is_ok());
    let err = parser
        .parse_expression("#list[3]")
        .unwrap()
        .get_value_in(&mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::IndexOutOfBounds);
}

#[test]
fn test_arrays_never_grow() {
    let mut ctx = EvaluationContext::standard()
        .with_variable("array", Value::array(ValueType::Integer, vec![Value::Integer(1)]))
        .build();
    let parser = ExpressionParser::with_config(ParserConfig::new(false, true));
    let err = parser
        .parse_expression("#array[1]")
        .unwrap()
        .get_value_in(&mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::IndexOutOfBounds);
}

#[test]
fn test_auto_grow_null_references() {
    let mut ctx = EvaluationContext::standard()
        .root(Value::object(Inventor::new("Nikola Tesla", "Serbian")))
        .build();
    inventor::register_types(ctx.types_mut());
    let parser = ExpressionParser::with_config(ParserConfig::new(true, false));

    parser
        .parse_expression("placeOfBirth.city = 'Smiljan'")
        .unwrap()
        .get_value_in(&mut ctx)
        .unwrap();
    let city = parser.parse_expression("placeOfBirth.city").unwrap();
    assert_eq!(city.get_value_in(&mut ctx).unwrap(), Value::from("Smiljan"));
}

#[test]
fn test_null_references_stay_null_without_auto_grow() {
    let mut ctx = EvaluationContext::standard()
        .root(Value::object(Inventor::new("Nikola Tesla", "Serbian")))
        .build();
    inventor::register_types(ctx.types_mut());
    let err = ExpressionParser::new()
        .parse_expression("placeOfBirth.city = 'Smiljan'")
        .unwrap()
        .get_value_in(&mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::NullNavigation);
}

#[test]
fn test_whitespace_in_strings_is_preserved() {
    assert_eq!(evaluate("'Hello world'").unwrap(), Value::from("Hello world"));
    assert_eq!(evaluate("'  '.length()").unwrap(), Value::Integer(2));
}

#[test]
fn test_errors_surface_as_expression_errors() {
    let err = evaluate("1 +").unwrap_err();
    assert!(matches!(err, spel_lite::ExpressionError::Parse(_)));
    let err = evaluate("1 / 0").unwrap_err();
    assert!(matches!(err, spel_lite::ExpressionError::Eval(_)));
}
