//! JSON rule files. Two layouts are accepted:
//!
//! ```json
//! {
//!     "rules": [
//!         {"name": "*", "shared": true},
//!         {"name": "App::Mailer", "constructParams": ["smtp"]}
//!     ]
//! }
//! ```
//!
//! or a map from type identifiers to rules, applied in file order:
//!
//! ```json
//! {
//!     "App::Mailer": {
//!         "substitutions": {"Transport": {"instance": "SmtpTransport"}},
//!         "call": [["setSender", ["noreply@example.com"]]]
//!     }
//! }
//! ```
//!
//! Objects with a single `instance` (optionally with `params`), `constant` or `call` key become
//! deferred values; any other object is a plain map.

use crate::loader::callback::parse_method_call;
use crate::loader::{malformed, LoaderError, RuleLoader};
use convert_case::{Case, Casing};
use itertools::Itertools;
use rulewire_di::rule::{MethodCall, Rule};
use rulewire_di::value::Value;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

const DIR_PLACEHOLDER: &str = "__DIR__";
const RULE_LIST_KEY: &str = "rules";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleDefinition {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    instance_of: Option<String>,
    #[serde(default)]
    shared: Option<bool>,
    #[serde(default)]
    inherit: Option<bool>,
    #[serde(default)]
    construct_params: Vec<JsonValue>,
    #[serde(default)]
    substitutions: Map<String, JsonValue>,
    #[serde(default)]
    share_instances: Vec<String>,
    #[serde(default)]
    call: Vec<JsonValue>,
    #[serde(default)]
    new_instances: Vec<String>,
    #[serde(flatten)]
    unknown: Map<String, JsonValue>,
}

/// Loads rules from JSON text.
#[derive(Clone, Debug)]
pub struct JsonLoader {
    json: String,
}

impl JsonLoader {
    pub fn new<T: ToString>(json: T) -> Self {
        Self {
            json: json.to_string(),
        }
    }

    /// Reads rules from a file, replacing `__DIR__` with the directory containing it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let io_error = |source| LoaderError::Io {
            path: path.display().to_string(),
            source,
        };

        let json = fs::read_to_string(path).map_err(io_error)?;
        let canonical = path.canonicalize().map_err(io_error)?;
        let dir = canonical
            .parent()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();

        Ok(Self::new(json.replace(DIR_PLACEHOLDER, &dir)))
    }
}

impl RuleLoader for JsonLoader {
    fn load(&self) -> Result<Vec<(String, Rule)>, LoaderError> {
        let root: JsonValue = serde_json::from_str(&self.json)?;
        let JsonValue::Object(root) = root else {
            return Err(malformed(RULE_LIST_KEY, "expected an object at the top level"));
        };

        let definitions = if matches!(root.get(RULE_LIST_KEY), Some(JsonValue::Array(_))) {
            listed_definitions(root)?
        } else {
            named_definitions(root)?
        };

        definitions
            .into_iter()
            .map(|(name, definition)| {
                trace!(%name, "Loaded rule definition.");
                let rule = convert_rule(&name, definition)?;
                Ok::<_, LoaderError>((name, rule))
            })
            .try_collect()
    }
}

fn listed_definitions(
    mut root: Map<String, JsonValue>,
) -> Result<Vec<(String, RuleDefinition)>, LoaderError> {
    let Some(JsonValue::Array(rules)) = root.remove(RULE_LIST_KEY) else {
        return Ok(Vec::new());
    };

    rules
        .into_iter()
        .map(|rule| {
            let definition: RuleDefinition = serde_json::from_value(rule)?;
            let name = definition
                .name
                .clone()
                .ok_or_else(|| malformed(RULE_LIST_KEY, "rule without a name"))?;
            Ok::<_, LoaderError>((name, definition))
        })
        .try_collect()
}

fn named_definitions(
    root: Map<String, JsonValue>,
) -> Result<Vec<(String, RuleDefinition)>, LoaderError> {
    root.into_iter()
        .map(|(name, rule)| {
            Ok::<_, LoaderError>((name, serde_json::from_value::<RuleDefinition>(rule)?))
        })
        .try_collect()
}

fn convert_rule(name: &str, definition: RuleDefinition) -> Result<Rule, LoaderError> {
    for key in definition.unknown.keys() {
        warn!(%name, %key, "Ignoring unknown rule setting.");
    }

    let mut rule = Rule::default().with_construct_params(
        definition
            .construct_params
            .into_iter()
            .map(|value| convert_value(name, value))
            .try_collect()?,
    );

    rule.shared = definition.shared;
    rule.inherit = definition.inherit;

    if let Some(instance_of) = definition.instance_of {
        rule = rule.with_instance_of(instance_of);
    }

    for (type_name, value) in definition.substitutions {
        rule = rule.with_substitution(type_name, convert_value(name, value)?);
    }

    for type_name in definition.share_instances {
        rule = rule.with_share_instance(type_name);
    }

    for call in definition.call {
        rule = rule.with_call(convert_call(name, call)?);
    }

    for type_name in definition.new_instances {
        rule = rule.with_new_instance(type_name);
    }

    Ok(rule)
}

fn convert_call(name: &str, call: JsonValue) -> Result<MethodCall, LoaderError> {
    let JsonValue::Array(call) = call else {
        return Err(malformed(name, "call entries must be [method, [arguments]] arrays"));
    };

    let mut call = call.into_iter();
    let method = match call.next() {
        Some(JsonValue::String(method)) => method.to_case(Case::Snake),
        _ => return Err(malformed(name, "call entries must start with a method name")),
    };

    let args = match call.next() {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(args)) => args
            .into_iter()
            .map(|arg| convert_value(name, arg))
            .try_collect()?,
        Some(_) => return Err(malformed(name, "call arguments must be an array")),
    };

    if call.next().is_some() {
        return Err(malformed(name, "unexpected call entry elements"));
    }

    Ok(MethodCall::new(method, args))
}

fn convert_value(name: &str, value: JsonValue) -> Result<Value, LoaderError> {
    Ok(match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(value) => Value::Bool(value),
        JsonValue::Number(number) => match number.as_i64() {
            Some(number) => Value::Int(number),
            None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(value) => Value::Str(value),
        JsonValue::Array(values) => Value::List(
            values
                .into_iter()
                .map(|value| convert_value(name, value))
                .try_collect()?,
        ),
        JsonValue::Object(object) => convert_object(name, object)?,
    })
}

enum Marker {
    Instance,
    Constant,
    Call,
}

fn convert_object(name: &str, mut object: Map<String, JsonValue>) -> Result<Value, LoaderError> {
    let marker = {
        let keys = object.keys().map(String::as_str).sorted().collect_vec();
        match keys.as_slice() {
            ["instance"] | ["instance", "params"] => Some(Marker::Instance),
            ["constant"] => Some(Marker::Constant),
            ["call"] => Some(Marker::Call),
            _ => None,
        }
    };

    match marker {
        Some(Marker::Instance) => {
            let type_name = match object.remove("instance") {
                Some(JsonValue::String(type_name)) => type_name,
                _ => return Err(malformed(name, "instance must be a type identifier")),
            };

            match object.remove("params") {
                None => Ok(Value::create(type_name)),
                Some(JsonValue::Array(params)) => Ok(Value::create_with(
                    type_name,
                    params
                        .into_iter()
                        .map(|param| convert_value(name, param))
                        .try_collect()?,
                )),
                Some(_) => Err(malformed(name, "instance params must be an array")),
            }
        }
        Some(Marker::Constant) => match object.remove("constant") {
            Some(JsonValue::String(constant)) => Ok(Value::constant(constant)),
            _ => Err(malformed(name, "constant must be a name")),
        },
        Some(Marker::Call) => match object.remove("call") {
            Some(JsonValue::String(spec)) => parse_method_call(&spec),
            _ => Err(malformed(name, "call must be a method call specification")),
        },
        None => Ok(Value::Map(
            object
                .into_iter()
                .map(|(key, value)| Ok::<_, LoaderError>((key, convert_value(name, value)?)))
                .try_collect()?,
        )),
    }
}
