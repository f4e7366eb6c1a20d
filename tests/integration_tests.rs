use spel_lite::inventor::{self, Inventor, PlaceOfBirth};
use spel_lite::{EvalError, EvalErrorKind, EvaluationContext, ExpressionParser, Value, ValueType};

fn context_for(root: Value) -> EvaluationContext {
    let mut ctx = EvaluationContext::standard().root(root).build();
    inventor::register_types(ctx.types_mut());
    ctx
}

fn tesla() -> EvaluationContext {
    context_for(Value::object(inventor::tesla()))
}

fn ieee() -> EvaluationContext {
    context_for(Value::object(inventor::ieee()))
}

fn eval_in(ctx: &mut EvaluationContext, source: &str) -> Result<Value, EvalError> {
    ExpressionParser::new()
        .parse_expression(source)
        .unwrap_or_else(|e| panic!("{} should parse: {}", source, e))
        .get_value_in(ctx)
}

fn eval(source: &str) -> Value {
    eval_in(&mut EvaluationContext::standard().build(), source).unwrap()
}

fn eval_err(source: &str) -> EvalError {
    eval_in(&mut EvaluationContext::standard().build(), source).unwrap_err()
}

fn strings(items: &[&str]) -> Value {
    Value::list(items.iter().map(|s| Value::string(*s)).collect())
}

fn integers(items: &[i64]) -> Value {
    Value::list(items.iter().map(|n| Value::Integer(*n)).collect())
}

#[test]
fn test_string_literal_methods() {
    assert_eq!(eval("'Hello World'"), Value::from("Hello World"));
    assert_eq!(eval("'Hello World'.concat('!')"), Value::from("Hello World!"));
    assert_eq!(eval("'Hello World'.bytes.size()"), Value::Integer(11));
    assert_eq!(eval("'Hello World'.toUpperCase()"), Value::from("HELLO WORLD"));
    assert_eq!(eval("new String('hello world').toUpperCase()"), Value::from("HELLO WORLD"));
}

#[test]
fn test_literal_values() {
    assert_eq!(eval("6.0221415E+23"), Value::Float(6.0221415E+23));
    assert_eq!(eval("0x7FFFFFFF"), Value::Integer(2147483647));
    assert_eq!(eval("true"), Value::Boolean(true));
    assert_eq!(eval("null"), Value::Null);
}

#[test]
fn test_root_properties() {
    let mut ctx = tesla();
    assert_eq!(eval_in(&mut ctx, "name").unwrap(), Value::from("Nikola Tesla"));
    assert_eq!(eval_in(&mut ctx, "placeOfBirth.city").unwrap(), Value::from("Smiljan"));
    assert_eq!(eval_in(&mut ctx, "birthdate.substring(0, 4)").unwrap(), Value::from("1856"));
    assert_eq!(eval_in(&mut ctx, "#root.nationality").unwrap(), Value::from("Serbian"));
}

#[test]
fn test_property_names_are_case_sensitive_after_first_letter() {
    let mut ctx = tesla();
    assert_eq!(eval_in(&mut ctx, "PlaceOfBirth.City").unwrap(), Value::from("Smiljan"));
    let err = eval_in(&mut ctx, "placeofbirth").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::PropertyNotFound);
}

#[test]
fn test_indexing_into_lists_and_maps() {
    let mut ctx = tesla();
    assert_eq!(eval_in(&mut ctx, "inventions[3]").unwrap(), Value::from("Induction motor"));
    assert_eq!(eval_in(&mut ctx, "name[0]").unwrap(), Value::from("N"));

    let mut ctx = ieee();
    assert_eq!(eval_in(&mut ctx, "members[0].name").unwrap(), Value::from("Nikola Tesla"));
    assert_eq!(eval_in(&mut ctx, "members[0].inventions[6]").unwrap(), Value::from("Wireless communication"));
    assert_eq!(
        eval_in(&mut ctx, "officers['president'].placeOfBirth.city").unwrap(),
        Value::from("Idvor")
    );
    assert_eq!(
        eval_in(&mut ctx, "officers['advisors'][0].placeOfBirth.country").unwrap(),
        Value::from("Croatia")
    );
    assert_eq!(eval_in(&mut ctx, "officers['nobody']").unwrap(), Value::Null);
}

#[test]
fn test_object_index_reads_property() {
    let mut ctx = tesla();
    assert_eq!(eval_in(&mut ctx, "#root['name']").unwrap(), Value::from("Nikola Tesla"));
}

#[test]
fn test_index_out_of_bounds() {
    let mut ctx = tesla();
    let err = eval_in(&mut ctx, "inventions[42]").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::IndexOutOfBounds);
    assert_eq!(eval_err("{1, 2}[-1]").kind(), EvalErrorKind::IndexOutOfBounds);
    assert_eq!(eval_err("'abc'[3]").kind(), EvalErrorKind::IndexOutOfBounds);
}

#[test]
fn test_methods_on_root() {
    let mut ctx = ieee();
    assert_eq!(eval_in(&mut ctx, "isMember('Mihajlo Pupin')").unwrap(), Value::Boolean(true));
    assert_eq!(eval_in(&mut ctx, "isMember('Marie Curie')").unwrap(), Value::Boolean(false));
}

#[test]
fn test_method_not_found() {
    let mut ctx = tesla();
    let err = eval_in(&mut ctx, "name.frobnicate()").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::MethodNotFound);
    assert_eq!(err.expression(), Some("name.frobnicate()"));
}

#[test]
fn test_error_names_failing_subexpression() {
    let mut ctx = tesla();
    let err = eval_in(&mut ctx, "'x' + placeOfBirth.planet").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::PropertyNotFound);
    assert_eq!(err.expression(), Some("placeOfBirth.planet"));
    assert!(err.to_string().contains("planet"));
}

#[test]
fn test_relational_operators() {
    assert_eq!(eval("2 == 2"), Value::Boolean(true));
    assert_eq!(eval("2 < -5.0"), Value::Boolean(false));
    assert_eq!(eval("'black' < 'block'"), Value::Boolean(true));
    assert_eq!(eval("1 == 1.0"), Value::Boolean(true));
    assert_eq!(eval("null < 0"), Value::Boolean(true));
    assert_eq!(eval("2 ge 2"), Value::Boolean(true));
}

#[test]
fn test_comparing_unrelated_types_fails() {
    assert_eq!(eval_err("'a' < 1").kind(), EvalErrorKind::TypeMismatch);
}

#[test]
fn test_instanceof_and_matches() {
    assert_eq!(eval("'xyz' instanceof T(Integer)"), Value::Boolean(false));
    assert_eq!(eval("'xyz' instanceof T(String)"), Value::Boolean(true));
    assert_eq!(eval("1.5 instanceof T(Number)"), Value::Boolean(true));
    assert_eq!(eval("null instanceof T(Object)"), Value::Boolean(false));
    assert_eq!(eval(r"'5.00' matches '^-?\d+(\.\d{2})?$'"), Value::Boolean(true));
    assert_eq!(eval(r"'5.0067' matches '^-?\d+(\.\d{2})?$'"), Value::Boolean(false));
    assert_eq!(eval("'abc' matches 'b'"), Value::Boolean(false));
}

#[test]
fn test_invalid_pattern() {
    assert_eq!(eval_err("'abc' matches '('").kind(), EvalErrorKind::InvalidPattern);
}

#[test]
fn test_logical_operators() {
    let mut ctx = ieee();
    assert_eq!(eval("true and false"), Value::Boolean(false));
    assert_eq!(
        eval_in(&mut ctx, "isMember('Nikola Tesla') and isMember('Mihajlo Pupin')").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_in(&mut ctx, "isMember('Nikola Tesla') or isMember('Albert Einstein')").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(eval("!true"), Value::Boolean(false));
    assert_eq!(
        eval_in(&mut ctx, "isMember('Nikola Tesla') and !isMember('Mihajlo Pupin')").unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(eval("false and 1 / 0 == 1"), Value::Boolean(false));
    assert_eq!(eval("true or #missing.name"), Value::Boolean(true));
}

#[test]
fn test_string_conditions_convert() {
    assert_eq!(eval("'yes' and 'on'"), Value::Boolean(true));
    assert_eq!(eval_err("'maybe' and true").kind(), EvalErrorKind::TypeMismatch);
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval("1 + 1"), Value::Integer(2));
    assert_eq!(eval("'test' + ' ' + 'string'"), Value::from("test string"));
    assert_eq!(eval("1000.00 - 1e4"), Value::Float(-9000.0));
    assert_eq!(eval("-2 * -3"), Value::Integer(6));
    assert_eq!(eval("2.0 * 3e0 * 4"), Value::Float(24.0));
    assert_eq!(eval("6 / -3"), Value::Integer(-2));
    assert_eq!(eval("8.0 / 4e0 / 2"), Value::Float(1.0));
    assert_eq!(eval("7 % 4"), Value::Integer(3));
    assert_eq!(eval("8 / 5 % 2"), Value::Integer(1));
    assert_eq!(eval("1 + 2 - 3 * 8"), Value::Integer(-21));
    assert_eq!(eval("2 ^ 10"), Value::Integer(1024));
    assert_eq!(eval("7 div 2"), Value::Integer(3));
}

#[test]
fn test_string_concatenation_renders_values() {
    assert_eq!(eval("'n=' + 1"), Value::from("n=1"));
    assert_eq!(eval("1 + '1'"), Value::from("11"));
    assert_eq!(eval("'ab' * 3"), Value::from("ababab"));
}

#[test]
fn test_arithmetic_failures() {
    assert_eq!(eval_err("1 / 0").kind(), EvalErrorKind::DivisionByZero);
    assert_eq!(eval_err("1.0 / 0").kind(), EvalErrorKind::DivisionByZero);
    assert_eq!(eval_err("5 % 0").kind(), EvalErrorKind::DivisionByZero);
    assert_eq!(eval_err("T(Integer).MAX_VALUE + 1").kind(), EvalErrorKind::Overflow);
    assert_eq!(eval_err("true + 1").kind(), EvalErrorKind::TypeMismatch);
}

#[test]
fn test_oversized_results_are_rejected() {
    assert_eq!(eval_err("'ab' * 9223372036854775807").kind(), EvalErrorKind::Overflow);
    assert_eq!(eval_err("'ab'.repeat(100000000)").kind(), EvalErrorKind::Overflow);
    assert_eq!(eval_err("new int[9223372036854775807]").kind(), EvalErrorKind::Overflow);
    assert_eq!(eval_err("new String[100000000]").kind(), EvalErrorKind::Overflow);
    assert_eq!(eval("''.repeat(9223372036854775807)"), Value::from(""));
    assert_eq!(eval("new int[3].size()"), Value::Integer(3));
}

#[test]
fn test_format_precision_is_bounded() {
    assert_eq!(eval("'%.2f'.formatted(1.0)"), Value::from("1.00"));
    assert_eq!(eval_err("'%.70000f'.formatted(1.0)").kind(), EvalErrorKind::TypeMismatch);
    assert_eq!(
        eval_err("'%.99999999999999999999f'.formatted(1.0)").kind(),
        EvalErrorKind::TypeMismatch
    );
    assert_eq!(eval_err("'%.f'.formatted(1.0)").kind(), EvalErrorKind::TypeMismatch);
}

#[test]
fn test_self_referential_collections() {
    let mut ctx = EvaluationContext::standard()
        .with_variable("m", Value::map_from([("name", "loop")]))
        .with_variable("n", Value::map_from([("name", "loop")]))
        .with_variable("l", integers(&[1, 2]))
        .build();
    eval_in(&mut ctx, "#m['self'] = #m").unwrap();
    eval_in(&mut ctx, "#n['self'] = #n").unwrap();
    eval_in(&mut ctx, "#l[1] = #l").unwrap();

    assert_eq!(
        eval_in(&mut ctx, "#m.toString()").unwrap(),
        Value::from("{name=loop, self=(this Map)}")
    );
    assert_eq!(eval_in(&mut ctx, "'' + #l").unwrap(), Value::from("[1, (this Collection)]"));
    assert_eq!(eval_in(&mut ctx, "#m == #m").unwrap(), Value::Boolean(true));
    assert_eq!(eval_in(&mut ctx, "#m == #n").unwrap(), Value::Boolean(true));
    assert_eq!(eval_in(&mut ctx, "#m == #l").unwrap(), Value::Boolean(false));
}

#[test]
fn test_assignment() {
    let mut ctx = tesla();
    assert_eq!(eval_in(&mut ctx, "name = 'Nikola'").unwrap(), Value::from("Nikola"));
    assert_eq!(eval_in(&mut ctx, "name").unwrap(), Value::from("Nikola"));
}

#[test]
fn test_assignment_through_navigation() {
    let mut ctx = ieee();
    eval_in(&mut ctx, "officers['advisors'][0].placeOfBirth.country = 'Serbia'").unwrap();
    assert_eq!(
        eval_in(&mut ctx, "members[0].placeOfBirth.country").unwrap(),
        Value::from("Serbia")
    );
}

#[test]
fn test_assignment_into_collections() {
    let mut ctx = EvaluationContext::standard()
        .with_variable("list", integers(&[1, 2, 3]))
        .with_variable("map", Value::map_from([("a", 1)]))
        .build();
    eval_in(&mut ctx, "#list[1] = 20").unwrap();
    eval_in(&mut ctx, "#map['b'] = 2").unwrap();
    eval_in(&mut ctx, "#map.c = 3").unwrap();
    assert_eq!(eval_in(&mut ctx, "#list").unwrap(), integers(&[1, 20, 3]));
    assert_eq!(eval_in(&mut ctx, "#map.size()").unwrap(), Value::Integer(3));
}

#[test]
fn test_assignment_converts_to_declared_type() {
    let record = spel_lite::Record::new("Counter")
        .with_typed_field("count", ValueType::Integer, 0)
        .into_value();
    let mut ctx = context_for(record);
    assert_eq!(eval_in(&mut ctx, "count = '41'").unwrap(), Value::Integer(41));
    assert_eq!(eval_in(&mut ctx, "count + 1").unwrap(), Value::Integer(42));
    assert_eq!(eval_in(&mut ctx, "count = 'many'").unwrap_err().kind(), EvalErrorKind::ConversionFailed);
}

#[test]
fn test_variables() {
    let mut ctx = tesla();
    ctx.set_variable("newName", Value::from("Mike Tesla"));
    eval_in(&mut ctx, "name = #newName").unwrap();
    assert_eq!(eval_in(&mut ctx, "name").unwrap(), Value::from("Mike Tesla"));

    assert_eq!(eval_in(&mut ctx, "#count = 3").unwrap(), Value::Integer(3));
    assert_eq!(ctx.variable("count"), Some(&Value::Integer(3)));
    assert_eq!(eval_in(&mut ctx, "#undefined").unwrap(), Value::Null);
}

#[test]
fn test_this_and_root() {
    let mut ctx = EvaluationContext::standard()
        .with_variable("primes", integers(&[2, 3, 5, 7, 11, 13, 17]))
        .build();
    assert_eq!(eval_in(&mut ctx, "#primes.?[#this > 10]").unwrap(), integers(&[11, 13, 17]));

    let mut ctx = ieee();
    assert_eq!(
        eval_in(&mut ctx, "members.![#root.name + ': ' + name]").unwrap(),
        strings(&["IEEE: Nikola Tesla", "IEEE: Mihajlo Pupin"])
    );
}

#[test]
fn test_functions() {
    let mut ctx = EvaluationContext::standard()
        .with_function("reverse", |args: &[Value]| {
            let text = args.first().and_then(Value::as_str).unwrap_or_default();
            Ok(Value::String(text.chars().rev().collect()))
        })
        .build();
    assert_eq!(eval_in(&mut ctx, "#reverse('hello')").unwrap(), Value::from("olleh"));
    assert_eq!(eval_in(&mut ctx, "#missing()").unwrap_err().kind(), EvalErrorKind::MethodNotFound);
}

#[test]
fn test_ternary() {
    assert_eq!(eval("false ? 'trueExp' : 'falseExp'"), Value::from("falseExp"));

    let mut ctx = ieee();
    ctx.set_variable("queryName", Value::from("Nikola Tesla"));
    let source = "isMember(#queryName) ? #queryName + ' is a member of the ' + name + ' Society' \
                  : #queryName + ' is not a member of the ' + name + ' Society'";
    assert_eq!(
        eval_in(&mut ctx, source).unwrap(),
        Value::from("Nikola Tesla is a member of the IEEE Society")
    );
}

#[test]
fn test_elvis() {
    let mut ctx = context_for(Value::object(Inventor::default()));
    assert_eq!(eval_in(&mut ctx, "name ?: 'Elvis Presley'").unwrap(), Value::from("Elvis Presley"));

    let mut ctx = tesla();
    assert_eq!(eval_in(&mut ctx, "name ?: 'Elvis Presley'").unwrap(), Value::from("Nikola Tesla"));
    assert_eq!(eval("null ?: 'fallback'"), Value::from("fallback"));
    assert_eq!(eval("0 ?: 1"), Value::Integer(0));
}

#[test]
fn test_safe_navigation() {
    let mut ctx = tesla();
    assert_eq!(eval_in(&mut ctx, "placeOfBirth?.city").unwrap(), Value::from("Smiljan"));

    let mut ctx = context_for(Value::object(Inventor::new("Nikola Tesla", "Serbian")));
    assert_eq!(eval_in(&mut ctx, "placeOfBirth?.city").unwrap(), Value::Null);
    assert_eq!(eval_in(&mut ctx, "placeOfBirth?.city?.length()").unwrap(), Value::Null);
    let err = eval_in(&mut ctx, "placeOfBirth.city").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::NullNavigation);
}

#[test]
fn test_null_root_safe_navigation() {
    assert_eq!(eval("#root?.missingProp"), Value::Null);
    assert_eq!(eval_err("#root.missingProp").kind(), EvalErrorKind::NullNavigation);
    assert_eq!(eval_err("#root.toString()").kind(), EvalErrorKind::NullNavigation);
}

#[test]
fn test_type_references() {
    assert_eq!(eval("T(String)"), Value::Type("String".to_string()));
    assert_eq!(eval("T(java.lang.String)"), Value::Type("String".to_string()));
    assert_eq!(eval("T(Math).PI"), Value::Float(std::f64::consts::PI));
    assert_eq!(eval("T(Math).max(3, 7)"), Value::Integer(7));
    assert_eq!(eval("T(RoundingMode).CEILING < T(RoundingMode).FLOOR"), Value::Boolean(true));
    assert_eq!(eval("T(RoundingMode).valueOf('DOWN').ordinal()"), Value::Integer(1));
    assert_eq!(eval_err("T(java.util.Date)").kind(), EvalErrorKind::TypeNotFound);
    assert_eq!(eval_err("T(Math).nope").kind(), EvalErrorKind::PropertyNotFound);
}

#[test]
fn test_random_is_a_fraction() {
    let Value::Float(n) = eval("T(Math).random() * 100.0") else {
        panic!("random should produce a float");
    };
    assert!((0.0..100.0).contains(&n));
}

#[test]
fn test_constructors() {
    let mut ctx = ieee();
    assert_eq!(
        eval_in(&mut ctx, "new Inventor('Albert Einstein', 'German').name").unwrap(),
        Value::from("Albert Einstein")
    );
    let inventor = eval_in(&mut ctx, "new Inventor('Albert Einstein', '1879-03-14', 'German')").unwrap();
    assert_eq!(inventor.type_name(), "Inventor");
    assert_eq!(eval_in(&mut ctx, "new Society()").unwrap().type_name(), "Society");
    assert_eq!(
        eval_in(&mut ctx, "new Inventor(1, 2, 3, 4)").unwrap_err().kind(),
        EvalErrorKind::TypeMismatch
    );
    assert_eq!(eval_err("new Widget()").kind(), EvalErrorKind::TypeNotFound);
}

#[test]
fn test_static_members_of_registered_types() {
    let mut ctx = ieee();
    assert_eq!(
        eval_in(&mut ctx, "officers[T(Society).President].name").unwrap(),
        Value::from("Mihajlo Pupin")
    );
}

#[test]
fn test_inline_lists_and_maps() {
    assert_eq!(eval("{1, 2, 3, 4}"), integers(&[1, 2, 3, 4]));
    assert_eq!(
        eval("{{'a', 'b'}, {'x', 'y'}}"),
        Value::list(vec![strings(&["a", "b"]), strings(&["x", "y"])])
    );
    let map = eval("{name: 'Nikola', dob: '10-July-1856'}");
    assert_eq!(map.to_string(), "{name=Nikola, dob=10-July-1856}");
    assert_eq!(eval("{name: 'Nikola'}.name"), Value::from("Nikola"));
    assert_eq!(eval("{:}.isEmpty()"), Value::Boolean(true));
    assert_eq!(eval("{}.size()"), Value::Integer(0));
}

#[test]
fn test_arrays() {
    let numbers = eval("new int[4]");
    assert_eq!(numbers.type_name(), "Array");
    assert_eq!(numbers.items().unwrap(), vec![Value::Integer(0); 4]);
    assert_eq!(eval("new int[]{1, 2, 3}[1]"), Value::Integer(2));
    assert_eq!(eval("new String[2][0]"), Value::from(""));
    assert_eq!(eval("new double[]{1, 2}[0]"), Value::Float(1.0));
}

#[test]
fn test_selection() {
    let mut ctx = ieee();
    assert_eq!(
        eval_in(&mut ctx, "members.?[nationality == 'Serbian'].size()").unwrap(),
        Value::Integer(2)
    );
    assert_eq!(
        eval_in(&mut ctx, "members.^[placeOfBirth.country == 'Serbia'].name").unwrap(),
        Value::from("Mihajlo Pupin")
    );
    assert_eq!(
        eval_in(&mut ctx, "members.$[nationality == 'Serbian'].name").unwrap(),
        Value::from("Mihajlo Pupin")
    );
    assert_eq!(eval_in(&mut ctx, "members.^[name == 'Nobody']").unwrap(), Value::Null);
}

#[test]
fn test_selection_over_maps() {
    let mut ctx = EvaluationContext::standard()
        .with_variable("scores", Value::map_from([("a", 1), ("b", 5), ("c", 9)]))
        .build();
    let selected = eval_in(&mut ctx, "#scores.?[value > 2]").unwrap();
    assert_eq!(selected, Value::map_from([("b", 5), ("c", 9)]));
    assert_eq!(eval_in(&mut ctx, "#scores.^[value > 2]").unwrap(), Value::map_from([("b", 5)]));
    assert_eq!(eval_in(&mut ctx, "#scores.$[value > 2]").unwrap(), Value::map_from([("c", 9)]));
    assert_eq!(eval_in(&mut ctx, "#scores.![key]").unwrap(), strings(&["a", "b", "c"]));
}

#[test]
fn test_selection_requires_boolean() {
    assert_eq!(eval_err("{1, 2}.?[#this + 1]").kind(), EvalErrorKind::TypeMismatch);
    assert_eq!(eval_err("'abc'.?[true]").kind(), EvalErrorKind::TypeMismatch);
}

#[test]
fn test_projection() {
    let mut ctx = ieee();
    assert_eq!(
        eval_in(&mut ctx, "members.![placeOfBirth.city]").unwrap(),
        strings(&["Smiljan", "Idvor"])
    );
    assert_eq!(eval("{1, 2, 3}.![#this * 2]"), integers(&[2, 4, 6]));
    assert_eq!(eval("#none?.![#this]"), Value::Null);
    assert_eq!(eval_err("#none.![#this]").kind(), EvalErrorKind::NullNavigation);
}

#[test]
fn test_builtin_methods() {
    assert_eq!(eval("'a,b,,c'.split(',')"), strings(&["a", "b", "", "c"]));
    assert_eq!(eval("'  x '.trim()"), Value::from("x"));
    assert_eq!(eval("'abc'.charAt(1)"), Value::from("b"));
    assert_eq!(eval("'abc'.indexOf('c')"), Value::Integer(2));
    assert_eq!(eval("'%s is %d'.formatted('x', 3)"), Value::from("x is 3"));
    assert_eq!(eval("{1, 2, 3}.contains(2)"), Value::Boolean(true));
    assert_eq!(eval("{a: 1}.containsKey('a')"), Value::Boolean(true));
    assert_eq!(eval("{a: 1, b: 2}.keySet()"), strings(&["a", "b"]));
    assert_eq!(eval("1.toString()"), Value::from("1"));
    assert_eq!(eval("'a'.equals('a')"), Value::Boolean(true));
}

#[test]
fn test_getters_of_nested_host_objects() {
    let place = Value::object(PlaceOfBirth::new("Smiljan", "Croatia"));
    let mut ctx = context_for(place);
    assert_eq!(eval_in(&mut ctx, "city + ', ' + country").unwrap(), Value::from("Smiljan, Croatia"));
    assert_eq!(eval_in(&mut ctx, "getCity()").unwrap(), Value::from("Smiljan"));
}
