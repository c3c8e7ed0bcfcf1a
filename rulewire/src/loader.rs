//! Loading of rules defined outside the code.

pub mod callback;
pub mod json;
pub mod xml;

#[cfg(test)]
use mockall::automock;
use rulewire_di::container::Container;
use crate::loader::json::JsonLoader;
use crate::loader::xml::XmlLoader;
use rulewire_di::rule::Rule;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Cannot read rule file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Cannot parse rules: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot parse rules: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Malformed rule for {name}: {message}")]
    MalformedRule { name: String, message: String },
    #[error("Malformed method call '{spec}': {message}")]
    MalformedCall { spec: String, message: String },
}

/// Source of rules in the form of identifier and rule fragment pairs.
#[cfg_attr(test, automock)]
pub trait RuleLoader {
    fn load(&self) -> Result<Vec<(String, Rule)>, LoaderError>;
}

pub(crate) fn malformed(name: &str, message: &str) -> LoaderError {
    LoaderError::MalformedRule {
        name: name.to_string(),
        message: message.to_string(),
    }
}

/// Creates a loader for given rule file. Files with the `xml` extension are read as XML, all
/// others as JSON.
pub fn rule_file_loader<P: AsRef<Path>>(path: P) -> Result<Box<dyn RuleLoader>, LoaderError> {
    let path = path.as_ref();
    let is_xml = path
        .extension()
        .map(|extension| extension.eq_ignore_ascii_case("xml"))
        .unwrap_or(false);

    if is_xml {
        Ok(Box::new(XmlLoader::from_file(path)?))
    } else {
        Ok(Box::new(JsonLoader::from_file(path)?))
    }
}

/// Adds all rules from the loader to the container, in order. Returns the number of added rules.
pub fn apply_rules(loader: &dyn RuleLoader, container: &mut Container) -> Result<usize, LoaderError> {
    let rules = loader.load()?;
    let count = rules.len();

    for (name, rule) in rules {
        debug!(%name, "Adding rule.");
        container.add_rule(name, rule);
    }

    Ok(count)
}
