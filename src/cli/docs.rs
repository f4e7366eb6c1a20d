//! Documentation content for the spel CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Operators,
    Collections,
    Methods,
    Types,
    Templates,
    Contexts,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" => Some(Self::Syntax),
            "operators" | "ops" => Some(Self::Operators),
            "collections" | "collection" | "lists" | "maps" => Some(Self::Collections),
            "methods" | "method" | "strings" => Some(Self::Methods),
            "types" | "type" => Some(Self::Types),
            "templates" | "template" => Some(Self::Templates),
            "contexts" | "context" | "variables" => Some(Self::Contexts),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"SPEL DOCUMENTATION

spel evaluates expressions against an object graph: the root object given as
JSON input or one of the sample fixtures. Expressions navigate properties,
call methods, filter and project collections, and assign values.

DOCUMENTATION CATEGORIES

  syntax            Literals, property navigation, indexing, and method calls
  operators         Arithmetic, relational, logical, ternary, elvis, assignment
  collections       Inline lists and maps, arrays, selection, and projection
  methods           Built-in methods on strings, lists, and maps
  types             T(...) references, constructors, static members, instanceof
  templates         Literal text with embedded #{...} expressions
  contexts          Variables, #root and #this, read-only evaluation, properties

QUICK REFERENCE

  name              Property of the root object
  a.b?.c            Safe navigation
  list[0]           Indexing
  #var              Variable
  T(Math).PI        Static member
  list.?[cond]      Selection
  list.![expr]      Projection

Run 'spel doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Syntax) => Ok(SYNTAX_DOC),
        Some(DocCategory::Operators) => Ok(OPERATORS_DOC),
        Some(DocCategory::Collections) => Ok(COLLECTIONS_DOC),
        Some(DocCategory::Methods) => Ok(METHODS_DOC),
        Some(DocCategory::Types) => Ok(TYPES_DOC),
        Some(DocCategory::Templates) => Ok(TEMPLATES_DOC),
        Some(DocCategory::Contexts) => Ok(CONTEXTS_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const SYNTAX_DOC: &str = r#"SYNTAX - Literals and Navigation

LITERALS
  'Hello World'       String; a doubled quote escapes it: 'It''s'
  "Hello"             Double-quoted string
  42, 0x1F, 10L       Integers (hex and long suffix accepted)
  6.0221415E+23       Float
  true, false, null

PROPERTIES
  name                Property of the active object (the root at top level)
  placeOfBirth.city   Nested property
  placeOfBirth?.city  Null when placeOfBirth is null, instead of an error

  Properties resolve through getName() / isName() first, then direct fields,
  then map keys.

INDEXING
  inventions[3]       List or array element
  name[0]             Character of a string
  officers['president']
                      Map entry by key
  tesla['name']       Property of an object by name

METHOD CALLS
  'abc'.toUpperCase()
  name.substring(0, 6)
  isMember('Mihajlo Pupin')

Examples:
  spel eval --fixture tesla "placeOfBirth.city"
  spel eval --fixture ieee "officers['president'].name"
"#;

const OPERATORS_DOC: &str = r#"OPERATORS - Arithmetic, Relational, and Logical

ARITHMETIC
  +  -  *  /  %  ^       Integer stays integer; any float widens the result
  'a' + 'b'              String concatenation
  'd' - 3                Shifts a single character: 'a'
  -x, +x

  Integer division by zero and float division by zero both fail.
  Integer overflow fails instead of wrapping.

RELATIONAL
  ==  !=  <  <=  >  >=   Symbolic forms
  eq  ne  lt  le  gt  ge Textual forms
  x between {1, 5}       Inclusive range check
  'abc' matches '[a-z]+' Whole-string regular expression
  x instanceof T(Integer)

  null compares lower than everything else.

LOGICAL
  and  or  not           Also &&, ||, !
  Both sides of and/or short-circuit.

CONDITIONAL
  cond ? a : b           Ternary
  name ?: 'unknown'      Elvis: falls back when null or empty

ASSIGNMENT
  name = 'Tesla'         Assigns and returns the new value
  #count = 1             Assigns a variable
"#;

const COLLECTIONS_DOC: &str = r#"COLLECTIONS - Lists, Maps, Selection, Projection

INLINE COLLECTIONS
  {1, 2, 3}              List
  {{'a', 'b'}, {'c'}}    Nested lists
  {name: 'Nikola', dob: '10-July-1856'}
                         Map; bare keys are strings
  {:}                    Empty map

ARRAYS
  new int[4]             Filled with defaults
  new int[]{1, 2, 3}     Initialized

  Arrays never grow; indexing past the end always fails.

SELECTION
  list.?[cond]           All matching elements
  list.^[cond]           First match
  list.$[cond]           Last match
  map.?[value > 1]       Entries, visited with key and value

PROJECTION
  members.![name]        Expression applied to every element
  map.![key]             Projecting a map yields a list

Inside ?[...] and ![...] the element is the active object and #this.

Examples:
  spel eval --fixture ieee "members.?[nationality == 'Serbian'].![name]"
  spel eval "{1, 2, 3, 4}.?[#this % 2 == 0]"
"#;

const METHODS_DOC: &str = r#"METHODS - Built-in Methods

STRING
  length(), isEmpty(), trim()
  toUpperCase(), toLowerCase()
  substring(start), substring(start, end), charAt(i)
  concat(s), repeat(n), replace(from, to)
  contains(s), startsWith(s), endsWith(s), indexOf(s)
  split(regex), getBytes(), formatted(args...)

LIST AND ARRAY
  size(), isEmpty(), get(i), contains(x), indexOf(x)

MAP
  size(), isEmpty(), get(k), containsKey(k), containsValue(v)
  keySet(), values()

ANY VALUE
  toString(), equals(x)

Zero-argument getters also work as properties:
  'abc'.bytes            Same as 'abc'.getBytes()
"#;

const TYPES_DOC: &str = r#"TYPES - Type References and Construction

TYPE REFERENCES
  T(Math)                Looked up by full or simple name
  T(Math).PI             Static member
  T(Math).max(3, 7)      Static method
  T(RoundingMode).FLOOR  Enum constant

BUILT-IN TYPES
  String, Integer, Float, Boolean, Math, List, Map, Object, Number,
  RoundingMode, and with the sample fixtures Inventor, PlaceOfBirth, Society

CONSTRUCTORS
  new String('hello')
  new Inventor('Albert Einstein', 'German')

INSTANCEOF
  'a' instanceof T(String)
  1 instanceof T(Number)

Data-binding contexts have no types: T(...) and new fail there.

CONVERSION (--target)
  String -> Boolean      true/yes/on/1, false/no/off/0
  String -> Integer      Parsed as a number
  Float  -> Integer      Only without a fractional part
  any    -> String       Rendered text
"#;

const TEMPLATES_DOC: &str = r##"TEMPLATES - Embedded Expressions

Template text mixes literal text with #{...} expressions. Each expression is
evaluated and rendered as text; a null renders as nothing.

  random number is #{T(Math).random()}
  #{name} was born in #{placeOfBirth.city}

A template that is a single expression returns its value unchanged, not text.
Braces inside strings or inline maps do not end the expression.

Examples:
  spel eval --template --fixture tesla "#{name} (#{nationality})"
  spel eval --template --property app.region=eu "region: #{environment['app.region']}"
"##;

const CONTEXTS_DOC: &str = r#"CONTEXTS - Variables and Evaluation Settings

VARIABLES
  #name                  Variable bound with --var name=value
  #root                  The root object
  #this                  The active object (the element inside ?[...] or ![...])

  Unknown variables evaluate to null. --var values parse as JSON when
  possible, otherwise as plain text.

READ-ONLY EVALUATION
  --read-only            Every assignment fails, including auto-grow

PROPERTIES
  environment['key']     Application property (--property key=value or the
                         [properties] table of the config file)
  systemProperties['k']  System property
  systemEnvironment['k'] Process environment variable

PARSER SETTINGS (config file, [parser] table)
  auto-grow-null-references   Create null intermediate objects on navigation
  auto-grow-collections       Pad lists indexed past their end
  maximum-auto-grow-size      Upper bound for padding
  compiler-mode               interpreted | immediate | mixed
  mixed-threshold             Interpreted runs before compiling in mixed mode
"#;

#[test]
fn test_every_category_has_docs() {
    for name in ["syntax", "operators", "collections", "methods", "types", "templates", "contexts"] {
        assert!(get_doc_category(name).is_ok(), "missing docs for {}", name);
    }
    assert!(matches!(get_doc_category("queries"), Err(CliError::UnknownCategory(_))));
}

#[test]
fn test_template_docs_show_embedded_expressions() {
    let docs = get_doc_category("templates").unwrap();
    assert!(docs.contains("\"#{name} (#{nationality})\""));
    assert!(docs.trim_end().ends_with("environment['app.region']}\""));
}
