use std::rc::Rc;

use spel_lite::inventor::{self, Inventor};
use spel_lite::{
    BeanRegistry, EvalError, EvalErrorKind, EvaluationContext, ExpressionParser, ParserConfig,
    PropertyAccessor, Record, StandardEnvironment, TypeConverter, TypeDescriptor, Value, ValueType,
};

fn eval_in(ctx: &mut EvaluationContext, source: &str) -> Result<Value, EvalError> {
    ExpressionParser::new().parse_expression(source).unwrap().get_value_in(ctx)
}

fn tesla_context() -> spel_lite::ContextBuilder {
    EvaluationContext::standard().root(Value::object(inventor::tesla()))
}

#[test]
fn test_read_only_context_rejects_assignment() {
    let mut ctx = EvaluationContext::for_read_only_data_binding()
        .root(Value::object(inventor::tesla()))
        .build();
    assert_eq!(eval_in(&mut ctx, "name").unwrap(), Value::from("Nikola Tesla"));

    let err = eval_in(&mut ctx, "name = 'Mike'").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::WriteNotPermitted);
    assert_eq!(eval_in(&mut ctx, "name").unwrap(), Value::from("Nikola Tesla"));

    let err = eval_in(&mut ctx, "#count = 1").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::WriteNotPermitted);
    assert!(ctx.variable("count").is_none());
}

#[test]
fn test_read_only_standard_context() {
    let mut ctx = tesla_context().read_only().build();
    assert!(!ctx.is_writable());
    assert_eq!(eval_in(&mut ctx, "T(Math).max(1, 2)").unwrap(), Value::Integer(2));
    assert_eq!(
        eval_in(&mut ctx, "placeOfBirth.city = 'Belgrade'").unwrap_err().kind(),
        EvalErrorKind::WriteNotPermitted
    );
}

#[test]
fn test_read_only_blocks_auto_grow() {
    let mut ctx = EvaluationContext::standard()
        .read_only()
        .with_variable("list", Value::typed_list(ValueType::Integer, Vec::new()))
        .build();
    let parser = ExpressionParser::with_config(ParserConfig::new(false, true));
    let err = parser
        .parse_expression("#list[2]")
        .unwrap()
        .get_value_in(&mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::WriteNotPermitted);
}

#[test]
fn test_read_write_data_binding_has_no_types() {
    let mut ctx = EvaluationContext::for_read_write_data_binding()
        .root(Value::object(inventor::tesla()))
        .build();
    assert_eq!(eval_in(&mut ctx, "name = 'Nikola'").unwrap(), Value::from("Nikola"));
    assert_eq!(eval_in(&mut ctx, "T(String)").unwrap_err().kind(), EvalErrorKind::TypeNotFound);
    assert_eq!(
        eval_in(&mut ctx, "new String('x')").unwrap_err().kind(),
        EvalErrorKind::TypeNotFound
    );
    assert_eq!(eval_in(&mut ctx, "name.length()").unwrap(), Value::Integer(6));
}

/// Answers `answer` on any receiver.
struct AnswerAccessor;

impl PropertyAccessor for AnswerAccessor {
    fn can_read(&self, _target: &Value, name: &str) -> bool {
        name == "answer"
    }

    fn read(&self, _target: &Value, _name: &str) -> Result<Value, EvalError> {
        Ok(Value::Integer(42))
    }
}

#[test]
fn test_custom_accessor_runs_after_builtin_ones() {
    let record = Record::new("Quiz").with_field("answer", 7).into_value();
    let mut ctx = EvaluationContext::standard()
        .root(record)
        .with_property_accessor(AnswerAccessor)
        .build();
    assert_eq!(eval_in(&mut ctx, "answer").unwrap(), Value::Integer(7));
    assert_eq!(eval_in(&mut ctx, "'text'.answer").unwrap(), Value::Integer(42));

    ctx.set_root(Value::Null);
    assert_eq!(eval_in(&mut ctx, "answer").unwrap(), Value::Integer(42));
}

#[test]
fn test_custom_accessor_cannot_write_by_default() {
    let mut ctx = EvaluationContext::standard().with_property_accessor(AnswerAccessor).build();
    let err = eval_in(&mut ctx, "'text'.answer = 1").unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::PropertyNotFound);
}

/// Converts everything to upper-case text.
struct ShoutingConverter;

impl TypeConverter for ShoutingConverter {
    fn can_convert(&self, _value: &Value, target: &ValueType) -> bool {
        *target == ValueType::String
    }

    fn convert(&self, value: Value, target: &ValueType) -> Result<Value, EvalError> {
        match target {
            ValueType::String => Ok(Value::String(value.to_string().to_uppercase())),
            _ => Err(EvalError::conversion_failed(&value, target)),
        }
    }
}

#[test]
fn test_custom_converter() {
    let mut ctx = EvaluationContext::standard().with_converter(ShoutingConverter).build();
    let expr = ExpressionParser::new().parse_expression("{1, 'a'}").unwrap();
    let value = expr.get_typed_value(&mut ctx, None, &ValueType::String).unwrap();
    assert_eq!(value, Value::from("[1, A]"));

    let expr = ExpressionParser::new().parse_expression("'7'").unwrap();
    let err = expr.get_typed_value(&mut ctx, None, &ValueType::Integer).unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::ConversionFailed);
}

#[test]
fn test_typed_values() {
    let parser = ExpressionParser::new();
    let mut ctx = EvaluationContext::standard().build();

    let value = parser
        .parse_expression("'42'")
        .unwrap()
        .get_typed_value(&mut ctx, None, &ValueType::Integer)
        .unwrap();
    assert_eq!(value, Value::Integer(42));

    let err = parser
        .parse_expression("'1.5'")
        .unwrap()
        .get_typed_value(&mut ctx, None, &ValueType::Integer)
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::ConversionFailed);

    let root = Value::object(inventor::tesla());
    let value = parser
        .parse_expression("name")
        .unwrap()
        .get_typed_value(&mut ctx, Some(&root), &ValueType::String)
        .unwrap();
    assert_eq!(value, Value::from("Nikola Tesla"));
}

#[test]
fn test_values_as_rust_types() {
    let parser = ExpressionParser::new();
    let mut ctx = EvaluationContext::standard().build();

    let flag: bool = parser.parse_expression("'yes'").unwrap().get_value_as(&mut ctx).unwrap();
    assert!(flag);

    let ratio: f64 = parser.parse_expression("3 / 2.0").unwrap().get_value_as(&mut ctx).unwrap();
    assert_eq!(ratio, 1.5);

    let missing: Option<String> = parser.parse_expression("null").unwrap().get_value_as(&mut ctx).unwrap();
    assert_eq!(missing, None);

    let parts: Vec<Value> = parser.parse_expression("'a, b'").unwrap().get_value_as(&mut ctx).unwrap();
    assert_eq!(parts, vec![Value::from("a"), Value::from("b")]);

    let err = parser
        .parse_expression("T(Integer).MAX_VALUE")
        .unwrap()
        .get_value_as::<i32>(&mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::ConversionFailed);
}

#[test]
fn test_set_value() {
    let root = Value::object(inventor::tesla());
    let mut ctx = EvaluationContext::standard().build();
    let parser = ExpressionParser::new();

    let city = parser.parse_expression("placeOfBirth.city").unwrap();
    city.set_value(&mut ctx, Some(&root), Value::from("Belgrade")).unwrap();
    assert_eq!(city.get_value_for(&root).unwrap(), Value::from("Belgrade"));

    let invention = parser.parse_expression("inventions[0]").unwrap();
    invention.set_value(&mut ctx, Some(&root), Value::from("Arc lamp")).unwrap();
    assert_eq!(invention.get_value_for(&root).unwrap(), Value::from("Arc lamp"));
}

#[test]
fn test_set_value_converts_to_declared_type() {
    let root = Record::new("Counter")
        .with_typed_field("count", ValueType::Integer, 0)
        .into_value();
    let mut ctx = EvaluationContext::standard().root(root.clone()).build();
    let expr = ExpressionParser::new().parse_expression("count").unwrap();
    expr.set_value(&mut ctx, None, Value::from("12")).unwrap();
    assert_eq!(expr.get_value_for(&root).unwrap(), Value::Integer(12));
}

#[test]
fn test_set_value_failures() {
    let root = Value::object(inventor::tesla());
    let parser = ExpressionParser::new();

    let mut read_only = EvaluationContext::for_read_only_data_binding().build();
    let err = parser
        .parse_expression("name")
        .unwrap()
        .set_value(&mut read_only, Some(&root), Value::from("x"))
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::WriteNotPermitted);

    let mut ctx = EvaluationContext::standard().build();
    let err = parser
        .parse_expression("1 + 1")
        .unwrap()
        .set_value(&mut ctx, Some(&root), Value::Integer(3))
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::TypeMismatch);

    let err = parser
        .parse_expression("birthdate")
        .unwrap()
        .set_value(&mut ctx, Some(&root), Value::from("1900-01-01"))
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::PropertyNotFound);
}

#[test]
fn test_variables_and_functions_on_context() {
    let mut ctx = EvaluationContext::standard().build();
    ctx.set_variable("greeting", Value::from("hello"));
    ctx.register_function("shout", |args: &[Value]| match args {
        [Value::String(s)] => Ok(Value::String(s.to_uppercase())),
        _ => Err(EvalError::type_mismatch("shout() takes one string")),
    });
    assert_eq!(eval_in(&mut ctx, "#shout(#greeting)").unwrap(), Value::from("HELLO"));
    assert_eq!(eval_in(&mut ctx, "#shout(1)").unwrap_err().kind(), EvalErrorKind::TypeMismatch);

    assert_eq!(ctx.remove_variable("greeting"), Some(Value::from("hello")));
    assert_eq!(eval_in(&mut ctx, "#greeting").unwrap(), Value::Null);
}

#[test]
fn test_registered_types() {
    let point = TypeDescriptor::new("com.acme.Point")
        .with_static("ORIGIN", "0,0")
        .with_constructor(|args| match args {
            [x, y] => Ok(Value::String(format!("{},{}", x, y))),
            _ => Err(EvalError::method_not_found("<init>", "Point", args.len())),
        })
        .with_static_method("of", |args| Ok(Value::Integer(args.len() as i64)));
    let mut ctx = EvaluationContext::standard().with_type(point).build();

    assert_eq!(eval_in(&mut ctx, "T(Point).ORIGIN").unwrap(), Value::from("0,0"));
    assert_eq!(eval_in(&mut ctx, "T(com.acme.Point).of(1, 2, 3)").unwrap(), Value::Integer(3));
    assert_eq!(eval_in(&mut ctx, "new Point(1, 2)").unwrap(), Value::from("1,2"));
    assert_eq!(
        eval_in(&mut ctx, "new Point()").unwrap_err().kind(),
        EvalErrorKind::MethodNotFound
    );
}

#[test]
fn test_property_namespaces() {
    let env = StandardEnvironment::new()
        .with_property("app.region", "eu")
        .with_system_property("user.language", "sr")
        .with_env_var("SPEL_TOKEN", "secret");
    let mut ctx = EvaluationContext::for_bean_definitions(Rc::new(env), Rc::new(BeanRegistry::new())).build();

    assert_eq!(eval_in(&mut ctx, "environment['app.region']").unwrap(), Value::from("eu"));
    assert_eq!(eval_in(&mut ctx, "environment['user.language']").unwrap(), Value::from("sr"));
    assert_eq!(eval_in(&mut ctx, "environment['SPEL_TOKEN']").unwrap(), Value::from("secret"));
    assert_eq!(eval_in(&mut ctx, "environment['missing']").unwrap(), Value::Null);
    assert_eq!(
        eval_in(&mut ctx, "systemProperties['spel.version']").unwrap(),
        Value::from(env!("CARGO_PKG_VERSION"))
    );
    assert_eq!(eval_in(&mut ctx, "systemProperties['app.region']").unwrap(), Value::Null);
    assert_eq!(eval_in(&mut ctx, "systemEnvironment['SPEL_TOKEN']").unwrap(), Value::from("secret"));
}

#[test]
fn test_namespaces_are_not_visible_in_standard_context() {
    let mut ctx = EvaluationContext::standard().build();
    assert_eq!(
        eval_in(&mut ctx, "environment['app.region']").unwrap_err().kind(),
        EvalErrorKind::NullNavigation
    );
}

#[test]
fn test_bean_references() {
    let config = Record::new("AppConfig").with_field("name", "inventory").into_value();
    let beans = BeanRegistry::new()
        .with_bean("config", config)
        .with_bean("tesla", Value::object(inventor::tesla()));
    let mut ctx =
        EvaluationContext::for_bean_definitions(Rc::new(StandardEnvironment::new()), Rc::new(beans)).build();

    assert_eq!(eval_in(&mut ctx, "@config.name").unwrap(), Value::from("inventory"));
    assert_eq!(eval_in(&mut ctx, "config.name").unwrap(), Value::from("inventory"));
    assert_eq!(eval_in(&mut ctx, "@tesla.placeOfBirth.city").unwrap(), Value::from("Smiljan"));
    assert_eq!(eval_in(&mut ctx, "@missing").unwrap_err().kind(), EvalErrorKind::BeanNotFound);
}

#[test]
fn test_bean_references_need_a_resolver() {
    let mut ctx = EvaluationContext::standard().build();
    assert_eq!(eval_in(&mut ctx, "@config").unwrap_err().kind(), EvalErrorKind::BeanNotFound);
}

#[test]
fn test_root_object_property_wins_over_bean() {
    let beans = BeanRegistry::new().with_bean("name", Value::from("bean"));
    let mut ctx = EvaluationContext::for_bean_definitions(Rc::new(StandardEnvironment::new()), Rc::new(beans))
        .root(Value::object(Inventor::new("Nikola Tesla", "Serbian")))
        .build();
    assert_eq!(eval_in(&mut ctx, "name").unwrap(), Value::from("Nikola Tesla"));
    assert_eq!(eval_in(&mut ctx, "@name").unwrap(), Value::from("bean"));
}
