// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The present/absent step shared by every mutating module.

use super::decision::{decide_presence, Action, Presence};
use crate::definition::{load_definition, str_at};
use crate::error::{Result, VirtError};
use crate::kubernetes::{ManagedResource, ResourceAccessor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Identity and base definition parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceParams {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub force: bool,
    #[serde(alias = "definition", alias = "inline")]
    pub resource_definition: Option<Value>,
    pub src: Option<PathBuf>,
}

impl ResourceParams {
    /// The caller's base definition, `{}` when none was given
    pub fn definition(&self) -> Result<Value> {
        let definition = load_definition(self.resource_definition.clone(), self.src.as_deref())?;
        Ok(definition.unwrap_or_else(|| json!({})))
    }

    /// `(name, namespace)`; parameters win over the definition's metadata
    pub fn identity(&self, definition: &Value) -> Result<(String, String)> {
        let name = self
            .name
            .as_deref()
            .or_else(|| str_at(definition, &["metadata", "name"]))
            .ok_or_else(|| VirtError::Validation("name is required".to_string()))?;
        let namespace = self
            .namespace
            .as_deref()
            .or_else(|| str_at(definition, &["metadata", "namespace"]))
            .ok_or_else(|| VirtError::Validation("namespace is required".to_string()))?;
        Ok((name.to_string(), namespace.to_string()))
    }
}

/// The decision taken and the object it left behind
#[derive(Debug)]
pub struct Outcome<K> {
    pub action: Action,
    pub object: Option<K>,
}

impl<K: Serialize> Outcome<K> {
    pub fn changed(&self) -> bool {
        self.action.changes()
    }

    /// The resulting object, or `{}` once deleted
    pub fn result(&self) -> Result<Value> {
        match &self.object {
            Some(obj) => Ok(serde_json::to_value(obj)?),
            None => Ok(json!({})),
        }
    }
}

/// Create, replace or delete `name` so it matches `state`.
///
/// In check mode the decision is made but nothing is sent.
#[instrument(skip(accessor, body), fields(namespace = accessor.namespace()))]
pub async fn ensure_presence<K: ManagedResource>(
    accessor: &ResourceAccessor<K>,
    name: &str,
    body: &Value,
    state: Presence,
    force: bool,
    check_mode: bool,
) -> Result<Outcome<K>> {
    let existing = accessor.get(name).await?;
    let action = decide_presence(existing.is_some(), state, force);
    debug!("Decided {:?} for {}", action, name);

    if check_mode {
        if action.changes() {
            info!("Check mode: skipping {:?} of {}", action, name);
        }
        return Ok(Outcome {
            action,
            object: existing,
        });
    }

    let object = match &action {
        Action::Create => Some(accessor.create(name, body).await?),
        Action::Replace => Some(accessor.replace(name, body).await?),
        Action::Patch(patch) => Some(accessor.patch(name, patch).await?),
        Action::Delete => {
            accessor.delete(name).await?;
            None
        }
        Action::NoOp => existing,
    };

    Ok(Outcome { action, object })
}
