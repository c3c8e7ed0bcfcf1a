//! XML rule files. The element layout nests every setting in its own element:
//!
//! ```xml
//! <rules>
//!     <rule>
//!         <name>App::Mailer</name>
//!         <shared>true</shared>
//!         <constructParams>
//!             <param>smtp</param>
//!             <param><instance>App::Templates</instance></param>
//!         </constructParams>
//!         <substitutions><as>Transport</as><use>SmtpTransport</use></substitutions>
//!         <call>
//!             <method>setSender</method>
//!             <params><param>noreply@example.com</param></params>
//!         </call>
//!     </rule>
//! </rules>
//! ```
//!
//! Documents in the [ATTRIBUTE_LAYOUT_NAMESPACE] namespace keep scalar settings in attributes:
//!
//! ```xml
//! <rules xmlns="https://r.je/dice/2.0">
//!     <rule name="App::Mailer" shared="true">
//!         <substitute as="Transport" use="SmtpTransport"/>
//!         <call method="setSender"><param>noreply@example.com</param></call>
//!     </rule>
//! </rules>
//! ```
//!
//! All values are strings, except `<instance>` elements which become deferred instances.

use crate::loader::{malformed, LoaderError, RuleLoader};
use convert_case::{Case, Casing};
use itertools::Itertools;
use roxmltree::{Document, Node};
use rulewire_di::rule::{MethodCall, Rule};
use rulewire_di::value::Value;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Namespace of documents using the attribute layout.
pub const ATTRIBUTE_LAYOUT_NAMESPACE: &str = "https://r.je/dice/2.0";

const INSTANCE: &str = "instance";

/// Loads rules from XML text.
#[derive(Clone, Debug)]
pub struct XmlLoader {
    xml: String,
}

impl XmlLoader {
    pub fn new<T: ToString>(xml: T) -> Self {
        Self {
            xml: xml.to_string(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        fs::read_to_string(path)
            .map(Self::new)
            .map_err(|source| LoaderError::Io {
                path: path.display().to_string(),
                source,
            })
    }
}

impl RuleLoader for XmlLoader {
    fn load(&self) -> Result<Vec<(String, Rule)>, LoaderError> {
        let document = Document::parse(&self.xml)?;
        let root = document.root_element();
        let attribute_layout = root.tag_name().namespace() == Some(ATTRIBUTE_LAYOUT_NAMESPACE);

        root.children()
            .filter(Node::is_element)
            .map(|node| {
                let (name, rule) = if attribute_layout {
                    attribute_rule(node)?
                } else {
                    element_rule(node)?
                };

                trace!(%name, "Loaded rule definition.");
                Ok::<_, LoaderError>((name, rule))
            })
            .try_collect()
    }
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

/// Element children of all `name` children.
fn nested_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    elements(node, name).flat_map(|parent| parent.children().filter(Node::is_element))
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or_default().trim()
}

fn child_text<'a>(node: Node<'a, '_>, name: &'static str) -> Option<&'a str> {
    elements(node, name).next().map(text)
}

fn parse_bool(rule: &str, value: &str) -> Result<bool, LoaderError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(malformed(rule, &format!("expected true or false, got: {value}"))),
    }
}

fn component(node: Node) -> Value {
    if node.tag_name().name() == INSTANCE {
        return Value::create(text(node));
    }

    match child_text(node, INSTANCE) {
        Some(type_name) => Value::create(type_name),
        None => Value::from(text(node)),
    }
}

/// Settings written the same way in both layouts.
fn common_settings(mut rule: Rule, node: Node) -> Rule {
    rule.construct_params = nested_elements(node, "constructParams")
        .map(component)
        .collect();

    for share in nested_elements(node, "shareInstances") {
        rule = rule.with_share_instance(text(share));
    }

    for new_instance in elements(node, "newInstances") {
        rule = rule.with_new_instance(text(new_instance));
    }

    rule
}

fn element_rule(node: Node) -> Result<(String, Rule), LoaderError> {
    let name = child_text(node, "name").ok_or_else(|| malformed("rule", "rule without a name"))?;
    let mut rule = common_settings(Rule::default(), node);

    if let Some(shared) = child_text(node, "shared") {
        rule.shared = Some(parse_bool(name, shared)?);
    }

    if let Some(inherit) = child_text(node, "inherit") {
        rule.inherit = Some(parse_bool(name, inherit)?);
    }

    if let Some(instance_of) = child_text(node, "instanceOf") {
        rule = rule.with_instance_of(instance_of);
    }

    for substitution in elements(node, "substitutions") {
        let (Some(type_name), Some(target)) =
            (child_text(substitution, "as"), child_text(substitution, "use"))
        else {
            return Err(malformed(name, "substitutions need both as and use"));
        };

        rule = rule.with_substitution(type_name, Value::create(target));
    }

    for call in elements(node, "call") {
        let method =
            child_text(call, "method").ok_or_else(|| malformed(name, "call without a method"))?;
        let args = nested_elements(call, "params").map(component).collect();

        rule = rule.with_call(MethodCall::new(method.to_case(Case::Snake), args));
    }

    Ok((name.to_string(), rule))
}

fn attribute_rule(node: Node) -> Result<(String, Rule), LoaderError> {
    let name = node
        .attribute("name")
        .ok_or_else(|| malformed("rule", "rule without a name"))?;
    let mut rule = common_settings(Rule::default(), node);

    if let Some(shared) = node.attribute("shared") {
        rule.shared = Some(parse_bool(name, shared)?);
    }

    if let Some(inherit) = node.attribute("inherit") {
        rule.inherit = Some(parse_bool(name, inherit)?);
    }

    if let Some(instance_of) = node.attribute("instanceOf") {
        rule = rule.with_instance_of(instance_of);
    }

    for substitution in elements(node, "substitute") {
        let (Some(type_name), Some(target)) =
            (substitution.attribute("as"), substitution.attribute("use"))
        else {
            return Err(malformed(name, "substitute needs both as and use"));
        };

        rule = rule.with_substitution(type_name, Value::create(target));
    }

    for call in elements(node, "call") {
        let method = call
            .attribute("method")
            .ok_or_else(|| malformed(name, "call without a method"))?;
        let args = call.children().filter(Node::is_element).map(component).collect();

        rule = rule.with_call(MethodCall::new(method.to_case(Case::Snake), args));
    }

    Ok((name.to_string(), rule))
}
