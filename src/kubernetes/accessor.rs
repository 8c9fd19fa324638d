// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Get/create/replace/delete/patch against one kind in one namespace.

use crate::definition::{merge_values, set_path};
use crate::error::{Result, VirtError};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Debug;
use tracing::{debug, info, instrument};

/// Bound shared by every kind the reconcilers manage
pub trait ManagedResource:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
}

impl<K> ManagedResource for K where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static
{
}

pub struct ResourceAccessor<K> {
    api: Api<K>,
    namespace: String,
}

impl<K: ManagedResource> ResourceAccessor<K> {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }

    pub fn api(&self) -> &Api<K> {
        &self.api
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn kind() -> String {
        K::kind(&()).to_string()
    }

    /// Fetch by name; a 404 means the object does not exist
    #[instrument(skip(self), fields(kind = %Self::kind(), namespace = %self.namespace))]
    pub async fn get(&self, name: &str) -> Result<Option<K>> {
        match self.api.get(name).await {
            Ok(obj) => Ok(Some(obj)),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("{} {}/{} not found", Self::kind(), self.namespace, name);
                Ok(None)
            }
            Err(e) => Err(VirtError::from_kube("get", e)),
        }
    }

    /// Like [`Self::get`], but absence is an error
    pub async fn get_existing(&self, name: &str) -> Result<K> {
        self.get(name).await?.ok_or_else(|| VirtError::Missing {
            kind: Self::kind(),
            namespace: self.namespace.clone(),
            name: name.to_string(),
        })
    }

    #[instrument(skip(self, lp), fields(kind = %Self::kind(), namespace = %self.namespace))]
    pub async fn list(&self, lp: &ListParams) -> Result<Vec<K>> {
        let list = self
            .api
            .list(lp)
            .await
            .map_err(|e| VirtError::from_kube("list", e))?;
        Ok(list.items)
    }

    /// Create from `body`, laid over an empty object of this kind
    #[instrument(skip(self, body), fields(kind = %Self::kind(), namespace = %self.namespace))]
    pub async fn create(&self, name: &str, body: &Value) -> Result<K> {
        let obj = self.complete(name, body.clone())?;

        info!("Creating {} {}/{}", Self::kind(), self.namespace, name);
        self.api
            .create(&PostParams::default(), &obj)
            .await
            .map_err(|e| VirtError::from_kube("create", e))
    }

    /// Replace with `body`, on top of the live object's `resourceVersion` and `status`
    #[instrument(skip(self, body), fields(kind = %Self::kind(), namespace = %self.namespace))]
    pub async fn replace(&self, name: &str, body: &Value) -> Result<K> {
        let current = self.get_existing(name).await?;
        let mut body = body.clone();

        if let Some(version) = current.resource_version() {
            set_path(&mut body, &["metadata", "resourceVersion"], Value::String(version));
        }
        if let Some(status) = serde_json::to_value(&current)?.get("status") {
            set_path(&mut body, &["status"], status.clone());
        }

        let obj = self.complete(name, body)?;
        info!("Replacing {} {}/{}", Self::kind(), self.namespace, name);
        self.api
            .replace(name, &PostParams::default(), &obj)
            .await
            .map_err(|e| VirtError::from_kube("replace", e))
    }

    #[instrument(skip(self), fields(kind = %Self::kind(), namespace = %self.namespace))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        info!("Deleting {} {}/{}", Self::kind(), self.namespace, name);
        self.api
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| VirtError::from_kube("delete", e))?;
        Ok(())
    }

    /// JSON merge patch, e.g. `{"spec": {"replicas": 2}}`
    #[instrument(skip(self, patch), fields(kind = %Self::kind(), namespace = %self.namespace))]
    pub async fn patch(&self, name: &str, patch: &Value) -> Result<K> {
        info!("Patching {} {}/{}: {}", Self::kind(), self.namespace, name, patch);
        self.api
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| VirtError::from_kube("patch", e))
    }

    /// Lay `body` over the kind's empty object and pin its identity fields
    fn complete(&self, name: &str, body: Value) -> Result<K> {
        let mut obj = merge_values(json!({"metadata": {}, "spec": {}}), body);
        set_path(&mut obj, &["apiVersion"], Value::String(K::api_version(&()).to_string()));
        set_path(&mut obj, &["kind"], Value::String(Self::kind()));
        set_path(&mut obj, &["metadata", "name"], Value::String(name.to_string()));
        set_path(
            &mut obj,
            &["metadata", "namespace"],
            Value::String(self.namespace.clone()),
        );
        Ok(serde_json::from_value(obj)?)
    }
}
