//! Parser for method call specifications, like `Config::get_database(main)::dsn`. The leading
//! segments name the type to create, the following ones are methods called in a chain, each on
//! the result of the previous one. The first segment with an argument list starts the chain; a
//! spec without any argument list calls only its last segment. A segment without an argument list
//! is a getter called without arguments.
//!
//! Arguments are literals: integers, floats, `true`, `false`, `null`, quoted strings, or bare
//! words treated as strings.

use crate::loader::LoaderError;
use convert_case::{Case, Casing};
use itertools::Itertools;
use rulewire_di::value::Value;

const SEPARATOR: &str = "::";

struct Segment<'a> {
    name: &'a str,
    args: Option<&'a str>,
}

fn malformed(spec: &str, message: &str) -> LoaderError {
    LoaderError::MalformedCall {
        spec: spec.to_string(),
        message: message.to_string(),
    }
}

/// Splits on `separator` outside of parentheses and quotes.
fn split_top_level<'a>(spec: &str, input: &'a str, separator: &str) -> Result<Vec<&'a str>, LoaderError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    let mut chars = input.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed(spec, "unbalanced parentheses"))?;
            }
            (None, _) if depth == 0 && input[index..].starts_with(separator) => {
                parts.push(&input[start..index]);
                start = index + separator.len();
                for _ in 1..separator.chars().count() {
                    chars.next();
                }
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(malformed(spec, "unterminated string"));
    }

    if depth != 0 {
        return Err(malformed(spec, "unbalanced parentheses"));
    }

    parts.push(&input[start..]);
    Ok(parts)
}

fn parse_segment<'a>(spec: &str, segment: &'a str) -> Result<Segment<'a>, LoaderError> {
    let segment = segment.trim();
    let (name, args) = match segment.find('(') {
        Some(open) => {
            let args = segment[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| malformed(spec, "unexpected characters after arguments"))?;
            (segment[..open].trim(), Some(args))
        }
        None => (segment, None),
    };

    if name.is_empty() {
        return Err(malformed(spec, "empty segment"));
    }

    Ok(Segment { name, args })
}

fn parse_literal(arg: &str) -> Value {
    let arg = arg.trim();

    for quote in ['\'', '"'] {
        if let Some(text) = arg
            .strip_prefix(quote)
            .and_then(|arg| arg.strip_suffix(quote))
        {
            return Value::from(text);
        }
    }

    match arg {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => arg
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| arg.parse::<f64>().map(Value::Float))
            .unwrap_or_else(|_| Value::from(arg)),
    }
}

fn parse_args(spec: &str, args: &str) -> Result<Vec<Value>, LoaderError> {
    if args.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(split_top_level(spec, args, ",")?
        .into_iter()
        .map(parse_literal)
        .collect())
}

/// Parses a method call specification into a chain of method call markers.
pub fn parse_method_call(spec: &str) -> Result<Value, LoaderError> {
    let input = spec.trim().trim_start_matches(SEPARATOR);
    let segments: Vec<_> = split_top_level(spec, input, SEPARATOR)?
        .into_iter()
        .map(|segment| parse_segment(spec, segment))
        .try_collect()?;

    if segments.len() < 2 {
        return Err(malformed(spec, "expected a type and at least one method"));
    }

    let first_method = segments
        .iter()
        .position(|segment| segment.args.is_some())
        .unwrap_or(segments.len() - 1)
        .max(1);

    if segments[..first_method]
        .iter()
        .any(|segment| segment.args.is_some())
    {
        return Err(malformed(spec, "the type cannot have arguments"));
    }

    let type_name = segments[..first_method]
        .iter()
        .map(|segment| segment.name)
        .join(SEPARATOR);

    segments[first_method..]
        .iter()
        .try_fold(Value::from(type_name), |target, segment| {
            let params = segment
                .args
                .map(|args| parse_args(spec, args))
                .transpose()?;

            Ok(Value::call_method(
                target,
                segment.name.to_case(Case::Snake),
                params,
            ))
        })
}

#[cfg(test)]
mod tests {
    use crate::loader::callback::parse_method_call;
    use crate::loader::LoaderError;
    use rulewire_di::type_name::TypeName;
    use rulewire_di::value::{LazyValue, Value};

    fn unwrap_method(value: Value) -> (Value, String, Option<Vec<Value>>) {
        match value {
            Value::Lazy(lazy) => match *lazy {
                LazyValue::Method {
                    target,
                    method,
                    params,
                } => (target, method, params),
                lazy => panic!("unexpected marker: {lazy:?}"),
            },
            value => panic!("unexpected value: {value:?}"),
        }
    }

    #[test]
    fn should_parse_getter() {
        let (target, method, params) =
            unwrap_method(parse_method_call("TestConfig::dbServer").unwrap());

        assert_eq!(target, Value::from("TestConfig"));
        assert_eq!(method, "db_server");
        assert!(params.is_none());
    }

    #[test]
    fn should_parse_method_without_arguments() {
        let (target, method, params) =
            unwrap_method(parse_method_call("TestConfig::getFoo()").unwrap());

        assert_eq!(target, Value::from("TestConfig"));
        assert_eq!(method, "get_foo");
        assert_eq!(params, Some(vec![]));
    }

    #[test]
    fn should_parse_literal_arguments() {
        let (_, method, params) = unwrap_method(
            parse_method_call("TestConfig::get_baz(10, 2.5, foobar, 'a, b', \"x::y\", true, null)")
                .unwrap(),
        );

        assert_eq!(method, "get_baz");
        assert_eq!(
            params,
            Some(vec![
                Value::from(10),
                Value::from(2.5),
                Value::from("foobar"),
                Value::from("a, b"),
                Value::from("x::y"),
                Value::from(true),
                Value::Null,
            ])
        );
    }

    #[test]
    fn should_parse_namespaced_type() {
        let (target, method, _) =
            unwrap_method(parse_method_call("::App::Config::get_foo()").unwrap());

        assert_eq!(target, Value::from("App::Config"));
        assert_eq!(method, "get_foo");
        assert_eq!(
            TypeName::new(target.as_str().unwrap()),
            TypeName::new("app::config")
        );
    }

    #[test]
    fn should_parse_chained_calls() {
        let (target, method, params) =
            unwrap_method(parse_method_call("TestConfig::getObj()::foo").unwrap());

        assert_eq!(method, "foo");
        assert!(params.is_none());

        let (target, method, _) = unwrap_method(target);
        assert_eq!(target, Value::from("TestConfig"));
        assert_eq!(method, "get_obj");
    }

    #[test]
    fn should_reject_malformed_specs() {
        for spec in [
            "",
            "TestConfig",
            "TestConfig::get(",
            "TestConfig::get())",
            "TestConfig::get('a)",
            "TestConfig::get(a)x",
            "TestConfig(a)::get()",
        ] {
            assert!(
                matches!(
                    parse_method_call(spec),
                    Err(LoaderError::MalformedCall { .. })
                ),
                "{spec}"
            );
        }
    }
}
