// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Building request bodies from `resource_definition`/`src` and flat parameters.

pub mod template;

use crate::error::{Result, VirtError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

pub use template::TemplateParams;

/// Deep merge two mappings; `overlay` wins on conflicts that are not both mappings.
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

/// Set `value` at `path`, creating intermediate mappings as needed.
pub fn set_path(root: &mut Value, path: &[&str], value: Value) {
    update_at(root, path, |slot| *slot = value);
}

/// Append `item` to the list at `path`, creating the list when missing.
pub fn push_at(root: &mut Value, path: &[&str], item: Value) {
    update_at(root, path, |slot| {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(item);
        }
    });
}

fn update_at(root: &mut Value, path: &[&str], f: impl FnOnce(&mut Value)) {
    match path.split_first() {
        None => f(root),
        Some((key, rest)) => {
            if !root.is_object() {
                *root = Value::Object(Map::new());
            }
            if let Value::Object(map) = root {
                let slot = map.entry(key.to_string()).or_insert(Value::Null);
                update_at(slot, rest, f);
            }
        }
    }
}

/// Resolve the caller's base definition from an inline mapping or a YAML file.
///
/// Modules that manage one object accept exactly one document.
pub fn load_definition(inline: Option<Value>, src: Option<&Path>) -> Result<Option<Value>> {
    let mut definitions = load_definitions(inline, src)?;
    match definitions.len() {
        0 | 1 => Ok(definitions.pop()),
        n => Err(VirtError::Validation(format!(
            "expected a single resource definition, found {}",
            n
        ))),
    }
}

/// Every object the caller supplied: all documents of a multi-document file or
/// string, a list of mappings, and the `items` of `*List` kinds.
pub fn load_definitions(inline: Option<Value>, src: Option<&Path>) -> Result<Vec<Value>> {
    let documents = match (inline, src) {
        (Some(_), Some(_)) => {
            return Err(VirtError::Validation(
                "parameters are mutually exclusive: resource_definition|src".to_string(),
            ))
        }
        (Some(Value::Object(map)), None) => vec![Value::Object(map)],
        (Some(Value::Array(items)), None) => items,
        (Some(Value::String(text)), None) => parse_documents(&text, "resource_definition")?,
        (Some(_), None) => {
            return Err(VirtError::Validation(
                "resource_definition must be a mapping, a list or a YAML string".to_string(),
            ))
        }
        (None, Some(path)) => {
            debug!("Loading resource definitions from {}", path.display());
            let text = std::fs::read_to_string(path).map_err(|e| {
                VirtError::Definition(format!(
                    "Error accessing {}. Does the file exist? {}",
                    path.display(),
                    e
                ))
            })?;
            parse_documents(&text, &path.display().to_string())?
        }
        (None, None) => return Ok(Vec::new()),
    };

    let mut definitions = Vec::with_capacity(documents.len());
    for document in documents {
        if !document.is_object() {
            return Err(VirtError::Definition(
                "expected a mapping with apiVersion, kind, metadata and spec".to_string(),
            ));
        }
        if is_list(&document) {
            if let Some(Value::Array(items)) = document.get("items") {
                definitions.extend(items.iter().cloned());
                continue;
            }
        }
        definitions.push(document);
    }
    Ok(definitions)
}

fn is_list(document: &Value) -> bool {
    str_at(document, &["kind"]).is_some_and(|kind| kind.to_lowercase().ends_with("list"))
}

/// Parse `---`-separated YAML documents, skipping empty ones.
fn parse_documents(text: &str, origin: &str) -> Result<Vec<Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)
            .map_err(|e| VirtError::Definition(format!("{}: {}", origin, e)))?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    if documents.is_empty() {
        return Err(VirtError::Definition(format!(
            "{}: no resource definition found",
            origin
        )));
    }
    Ok(documents)
}

/// String field at `path` of a definition, e.g. `["metadata", "name"]`
pub fn str_at<'a>(definition: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(definition, |value, key| value.get(key))
        .and_then(Value::as_str)
}

/// Recursively drop null and empty-string entries from mappings.
pub fn prune_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null() && v.as_str() != Some(""))
                .map(|(k, v)| (k, prune_empty(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune_empty).collect()),
        other => other,
    }
}
