//! Reading, mutating and writing a service's `values.yaml`.
//!
//! Documents are kept as generic [`serde_yaml::Value`]s so keys this tool does
//! not know about survive the round trip. Mappings are insertion-ordered, so
//! unrelated keys also keep their position.
//!
//! Writing goes through the `yaml-rust2` emitter rather than `serde_yaml`.
//! Helm reads values as YAML 1.1, where bare `yes`, `on`, `off` and friends
//! are booleans; that emitter keeps such strings quoted.

use crate::error::{ConfiguratorError, Result};
use crate::latency::{format_latency, EXTRA_LATENCY_ENV, LEGACY_LATENCY_FIELD};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;
use yaml_rust2::yaml::Hash;
use yaml_rust2::{Yaml, YamlEmitter};

const CONTAINER_KEY: &str = "container";
const ENV_KEY: &str = "env";
const NAME_KEY: &str = "name";
const VALUE_KEY: &str = "value";

/// Shape problems that stop a document from being updated
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("document root is not a mapping")]
    RootNotMapping,

    #[error("'container' section not found")]
    MissingContainer,

    #[error("'container' section is not a mapping")]
    ContainerNotMapping,

    #[error("'container.env' is not a sequence")]
    EnvNotSequence,
}

/// Read and parse a values file.
///
/// # Errors
///
/// [`ConfiguratorError::Read`] if the file cannot be read,
/// [`ConfiguratorError::Parse`] if it is not valid YAML.
pub fn load(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path).map_err(|source| ConfiguratorError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| ConfiguratorError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize `doc` in block style and overwrite `path` with it.
///
/// # Errors
///
/// [`ConfiguratorError::Serialize`] when the document holds something the
/// emitter cannot represent (custom tags), [`ConfiguratorError::Write`] when
/// the file cannot be written.
pub fn store(path: &Path, doc: &Value) -> Result<()> {
    let serialize_err = |reason: String| ConfiguratorError::Serialize {
        path: path.to_path_buf(),
        reason,
    };

    let yaml = to_emitter_yaml(doc).map_err(serialize_err)?;
    let mut rendered = String::new();
    YamlEmitter::new(&mut rendered)
        .dump(&yaml)
        .map_err(|e| serialize_err(e.to_string()))?;

    // The emitter always opens with a document marker and omits the final newline
    let mut rendered = rendered
        .strip_prefix("---\n")
        .map(str::to_owned)
        .unwrap_or(rendered);
    rendered.push('\n');

    fs::write(path, rendered).map_err(|source| ConfiguratorError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn to_emitter_yaml(value: &Value) -> std::result::Result<Yaml, String> {
    Ok(match value {
        Value::Null => Yaml::Null,
        Value::Bool(b) => Yaml::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Yaml::Integer(i),
            None => Yaml::Real(n.to_string()),
        },
        Value::String(s) => Yaml::String(s.clone()),
        Value::Sequence(items) => Yaml::Array(
            items
                .iter()
                .map(to_emitter_yaml)
                .collect::<std::result::Result<_, _>>()?,
        ),
        Value::Mapping(mapping) => {
            let mut hash = Hash::new();
            for (k, v) in mapping {
                hash.insert(to_emitter_yaml(k)?, to_emitter_yaml(v)?);
            }
            Yaml::Hash(hash)
        }
        Value::Tagged(tagged) => {
            return Err(format!("custom tag {} is not supported", tagged.tag));
        }
    })
}

/// Set the `EXTRA_LATENCY` env entry (and optionally the legacy integer field)
/// on a parsed values document.
///
/// The first entry named `EXTRA_LATENCY` is updated in place. If there is none,
/// a new entry is appended. A missing or null `container.env` becomes an empty
/// sequence first. The document is left untouched when an error is returned.
///
/// # Errors
///
/// Returns a [`SchemaViolation`] when `container` or `container.env` has the
/// wrong shape.
pub fn apply_extra_latency(
    doc: &mut Value,
    latency_ms: i64,
    legacy_field: bool,
) -> std::result::Result<(), SchemaViolation> {
    let root = doc.as_mapping_mut().ok_or(SchemaViolation::RootNotMapping)?;
    let container = root
        .get_mut(CONTAINER_KEY)
        .ok_or(SchemaViolation::MissingContainer)?
        .as_mapping_mut()
        .ok_or(SchemaViolation::ContainerNotMapping)?;

    match container.get(ENV_KEY) {
        None | Some(Value::Null) => {
            container.insert(Value::from(ENV_KEY), Value::Sequence(Vec::new()));
        }
        Some(Value::Sequence(_)) => {}
        Some(_) => return Err(SchemaViolation::EnvNotSequence),
    }

    let entries = container
        .get_mut(ENV_KEY)
        .and_then(Value::as_sequence_mut)
        .ok_or(SchemaViolation::EnvNotSequence)?;

    let value = Value::String(format_latency(latency_ms));
    match entries
        .iter_mut()
        .filter_map(Value::as_mapping_mut)
        .find(|entry| is_extra_latency_entry(entry))
    {
        Some(entry) => {
            entry.insert(Value::from(VALUE_KEY), value);
        }
        None => {
            let mut entry = Mapping::new();
            entry.insert(Value::from(NAME_KEY), Value::from(EXTRA_LATENCY_ENV));
            entry.insert(Value::from(VALUE_KEY), value);
            entries.push(Value::Mapping(entry));
        }
    }

    if legacy_field {
        container.insert(Value::from(LEGACY_LATENCY_FIELD), Value::from(latency_ms));
    }

    Ok(())
}

/// Raw value of the first `EXTRA_LATENCY` env entry, if any.
///
/// Numeric values are returned in their textual form.
pub fn read_extra_latency(doc: &Value) -> Option<String> {
    doc.get(CONTAINER_KEY)?
        .get(ENV_KEY)?
        .as_sequence()?
        .iter()
        .filter_map(Value::as_mapping)
        .find(|entry| is_extra_latency_entry(entry))
        .and_then(|entry| match entry.get(VALUE_KEY)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn is_extra_latency_entry(entry: &Mapping) -> bool {
    entry.get(NAME_KEY).and_then(Value::as_str) == Some(EXTRA_LATENCY_ENV)
}
