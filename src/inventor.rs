//! Sample domain: inventors, their birthplaces, and a society they belong to.
//!
//! Used by the test suite and by `spel eval --fixture`.

use indexmap::IndexMap;

use crate::{
    evaluator::EvalError,
    types::{TypeDescriptor, TypeRegistry},
    value::{HostObject, Value, ValueType},
};

fn text_arg(method: &str, value: &Value) -> Result<String, EvalError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(EvalError::type_mismatch(format!(
            "{}() expects a string, got {}",
            method,
            other.type_name()
        ))),
    }
}

fn text_args(type_name: &str, args: &[Value]) -> Result<Vec<String>, EvalError> {
    args.iter()
        .map(|arg| text_arg(&format!("{}.<init>", type_name), arg))
        .collect()
}

/// Runs a setter body and answers `null`, the way a void setter does.
fn setter(result: Result<(), EvalError>) -> Option<Result<Value, EvalError>> {
    Some(result.map(|()| Value::Null))
}

#[derive(Debug, Clone, Default)]
pub struct PlaceOfBirth {
    pub city: String,
    pub country: String,
}

impl PlaceOfBirth {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        PlaceOfBirth {
            city: city.into(),
            country: country.into(),
        }
    }
}

impl HostObject for PlaceOfBirth {
    fn type_name(&self) -> &str {
        "PlaceOfBirth"
    }

    fn has_method(&self, name: &str) -> bool {
        matches!(name, "getCity" | "setCity" | "getCountry" | "setCountry")
    }

    fn invoke(&mut self, method: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        match (method, args) {
            ("getCity", []) => Some(Ok(Value::string(&self.city))),
            ("getCountry", []) => Some(Ok(Value::string(&self.country))),
            ("setCity", [city]) => setter(text_arg(method, city).map(|city| self.city = city)),
            ("setCountry", [country]) => {
                setter(text_arg(method, country).map(|country| self.country = country))
            }
            _ => None,
        }
    }

    fn property_type(&self, name: &str) -> Option<ValueType> {
        matches!(name, "city" | "country").then_some(ValueType::String)
    }

    fn fields(&self) -> Vec<(String, Value)> {
        vec![
            ("city".to_string(), Value::string(&self.city)),
            ("country".to_string(), Value::string(&self.country)),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Inventor {
    pub name: String,
    pub nationality: String,
    /// ISO date, e.g. `1856-07-10`
    pub birthdate: String,
    pub place_of_birth: Value,
    pub inventions: Value,
}

impl Default for Inventor {
    fn default() -> Self {
        Inventor {
            name: String::new(),
            nationality: String::new(),
            birthdate: String::new(),
            place_of_birth: Value::Null,
            inventions: Value::Null,
        }
    }
}

impl Inventor {
    pub fn new(name: impl Into<String>, nationality: impl Into<String>) -> Self {
        Inventor {
            name: name.into(),
            nationality: nationality.into(),
            ..Default::default()
        }
    }

    pub fn with_birthdate(mut self, birthdate: impl Into<String>) -> Self {
        self.birthdate = birthdate.into();
        self
    }

    pub fn with_place_of_birth(mut self, place: PlaceOfBirth) -> Self {
        self.place_of_birth = Value::object(place);
        self
    }

    pub fn with_inventions(mut self, inventions: &[&str]) -> Self {
        self.inventions = Value::array(
            ValueType::String,
            inventions.iter().map(|i| Value::string(*i)).collect(),
        );
        self
    }
}

impl HostObject for Inventor {
    fn type_name(&self) -> &str {
        "Inventor"
    }

    fn has_method(&self, name: &str) -> bool {
        matches!(
            name,
            "getName"
                | "setName"
                | "getNationality"
                | "setNationality"
                | "getBirthdate"
                | "getPlaceOfBirth"
                | "setPlaceOfBirth"
                | "getInventions"
                | "setInventions"
        )
    }

    fn invoke(&mut self, method: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        match (method, args) {
            ("getName", []) => Some(Ok(Value::string(&self.name))),
            ("getNationality", []) => Some(Ok(Value::string(&self.nationality))),
            ("getBirthdate", []) => Some(Ok(Value::string(&self.birthdate))),
            ("getPlaceOfBirth", []) => Some(Ok(self.place_of_birth.clone())),
            ("getInventions", []) => Some(Ok(self.inventions.clone())),
            ("setName", [name]) => setter(text_arg(method, name).map(|name| self.name = name)),
            ("setNationality", [nationality]) => {
                setter(text_arg(method, nationality).map(|n| self.nationality = n))
            }
            ("setPlaceOfBirth", [place]) => {
                self.place_of_birth = place.clone();
                setter(Ok(()))
            }
            ("setInventions", [inventions]) => {
                self.inventions = inventions.clone();
                setter(Ok(()))
            }
            _ => None,
        }
    }

    fn property_type(&self, name: &str) -> Option<ValueType> {
        match name {
            "name" | "nationality" | "birthdate" => Some(ValueType::String),
            "placeOfBirth" => Some(ValueType::Object("PlaceOfBirth".to_string())),
            "inventions" => Some(ValueType::List),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(String, Value)> {
        vec![
            ("name".to_string(), Value::string(&self.name)),
            ("nationality".to_string(), Value::string(&self.nationality)),
        ]
    }
}

pub const ADVISORS: &str = "advisors";
pub const PRESIDENT: &str = "president";

#[derive(Debug, Clone)]
pub struct Society {
    pub name: String,
    pub members: Value,
    pub officers: Value,
}

impl Default for Society {
    fn default() -> Self {
        Society {
            name: String::new(),
            members: Value::typed_list(ValueType::Object("Inventor".to_string()), Vec::new()),
            officers: Value::map(IndexMap::new()),
        }
    }
}

impl Society {
    pub fn new(name: impl Into<String>) -> Self {
        Society {
            name: name.into(),
            ..Default::default()
        }
    }

    fn member_named(&self, name: &str) -> bool {
        self.members.items().unwrap_or_default().iter().any(|member| match member {
            Value::Object(obj) => obj
                .try_borrow_mut()
                .ok()
                .and_then(|mut obj| obj.invoke("getName", &[]))
                .and_then(Result::ok)
                .is_some_and(|n| n.as_str() == Some(name)),
            _ => false,
        })
    }
}

impl HostObject for Society {
    fn type_name(&self) -> &str {
        "Society"
    }

    fn has_method(&self, name: &str) -> bool {
        matches!(
            name,
            "getName" | "setName" | "getMembers" | "getOfficers" | "isMember"
        )
    }

    fn invoke(&mut self, method: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        match (method, args) {
            ("getName", []) => Some(Ok(Value::string(&self.name))),
            ("setName", [name]) => setter(text_arg(method, name).map(|name| self.name = name)),
            ("getMembers", []) => Some(Ok(self.members.clone())),
            ("getOfficers", []) => Some(Ok(self.officers.clone())),
            ("isMember", [name]) => Some(text_arg(method, name).map(|name| Value::Boolean(self.member_named(&name)))),
            _ => None,
        }
    }

    fn property_type(&self, name: &str) -> Option<ValueType> {
        match name {
            "name" => Some(ValueType::String),
            "members" => Some(ValueType::List),
            "officers" => Some(ValueType::Map),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(String, Value)> {
        vec![("name".to_string(), Value::string(&self.name))]
    }
}

/// Registers `Inventor`, `PlaceOfBirth`, and `Society` for `new` and `T(...)`.
pub fn register_types(registry: &mut TypeRegistry) {
    registry.register(TypeDescriptor::new("Inventor").with_constructor(|args| {
        match text_args("Inventor", args)?.as_slice() {
            [] => Ok(Value::object(Inventor::default())),
            [name, nationality] => Ok(Value::object(Inventor::new(name, nationality))),
            [name, birthdate, nationality] => Ok(Value::object(
                Inventor::new(name, nationality).with_birthdate(birthdate),
            )),
            _ => Err(EvalError::method_not_found("<init>", "Inventor", args.len())),
        }
    }));

    registry.register(TypeDescriptor::new("PlaceOfBirth").with_constructor(|args| {
        match text_args("PlaceOfBirth", args)?.as_slice() {
            [] => Ok(Value::object(PlaceOfBirth::default())),
            [city] => Ok(Value::object(PlaceOfBirth::new(city, ""))),
            [city, country] => Ok(Value::object(PlaceOfBirth::new(city, country))),
            _ => Err(EvalError::method_not_found("<init>", "PlaceOfBirth", args.len())),
        }
    }));

    registry.register(
        TypeDescriptor::new("Society")
            .with_constructor(|args| match args {
                [] => Ok(Value::object(Society::default())),
                _ => Err(EvalError::method_not_found("<init>", "Society", args.len())),
            })
            .with_static("Advisors", ADVISORS)
            .with_static("President", PRESIDENT),
    );
}

pub fn tesla() -> Inventor {
    Inventor::new("Nikola Tesla", "Serbian")
        .with_birthdate("1856-07-10")
        .with_place_of_birth(PlaceOfBirth::new("Smiljan", "Croatia"))
        .with_inventions(&[
            "Telephone repeater",
            "Rotating magnetic field principle",
            "Polyphase alternating-current system",
            "Induction motor",
            "Alternating-current power transmission",
            "Tesla coil transformer",
            "Wireless communication",
            "Radio",
            "Fluorescent lights",
        ])
}

pub fn pupin() -> Inventor {
    Inventor::new("Mihajlo Pupin", "Serbian")
        .with_birthdate("1854-10-09")
        .with_place_of_birth(PlaceOfBirth::new("Idvor", "Serbia"))
        .with_inventions(&["Pupin coil"])
}

/// The IEEE with Pupin as president and Tesla as advisor.
pub fn ieee() -> Society {
    let tesla = Value::object(tesla());
    let pupin = Value::object(pupin());
    let mut society = Society::new("IEEE");
    society.members = Value::typed_list(
        ValueType::Object("Inventor".to_string()),
        vec![tesla.clone(), pupin.clone()],
    );
    society.officers = Value::map_from([
        (PRESIDENT, pupin),
        (ADVISORS, Value::list(vec![tesla])),
    ]);
    society
}
