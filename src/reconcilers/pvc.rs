// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `pvc`: PersistentVolumeClaims, optionally populated by a CDI import.

use super::decision::{Action, Presence};
use super::presence::{ensure_presence, Outcome, ResourceParams};
use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::constants::cdi;
use crate::constants::wait::PVC_TIMEOUT_SECS;
use crate::definition::{merge_values, set_path};
use crate::error::{Result, VirtError};
use crate::kubernetes::conditions::pvc_ready;
use crate::kubernetes::{await_object, ResourceAccessor};
use crate::types::ModuleOutput;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ContentType {
    Kubevirt,
    Archive,
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            ContentType::Kubevirt => "kubevirt",
            ContentType::Archive => "archive",
        }
    }
}

#[derive(Debug, Deserialize)]
struct PvcParams {
    #[serde(default)]
    state: Presence,
    #[serde(flatten)]
    resource: ResourceParams,
    annotations: Option<Map<String, Value>>,
    labels: Option<Map<String, Value>>,
    selector: Option<Value>,
    access_modes: Option<Vec<String>>,
    resources: Option<Value>,
    storage_class_name: Option<String>,
    volume_mode: Option<String>,
    volume_name: Option<String>,
    cdi_import_endpoint: Option<String>,
    #[serde(default = "default_import_source")]
    cdi_import_source: String,
    cdi_content_type: Option<ContentType>,
    cdi_import_secret_name: Option<String>,
    #[serde(default)]
    wait: bool,
    #[serde(default = "default_wait_timeout")]
    wait_timeout: u64,
}

fn default_import_source() -> String {
    cdi::DEFAULT_IMPORT_SOURCE.to_string()
}

fn default_wait_timeout() -> u64 {
    PVC_TIMEOUT_SECS
}

impl PvcParams {
    fn build(&self) -> Result<Value> {
        let mut claim = json!({"metadata": {}, "spec": {}});

        let mut annotations = self.annotations.clone().unwrap_or_default();
        let mut labels = self.labels.clone().unwrap_or_default();

        if let Some(endpoint) = &self.cdi_import_endpoint {
            Url::parse(endpoint).map_err(|e| {
                VirtError::Validation(format!("cdi_import_endpoint '{}' is not a URL: {}", endpoint, e))
            })?;
            annotations.insert(cdi::IMPORT_ENDPOINT.to_string(), json!(endpoint));
            annotations.insert(cdi::IMPORT_SOURCE.to_string(), json!(self.cdi_import_source));
            if let Some(content_type) = self.cdi_content_type {
                annotations.insert(cdi::CONTENT_TYPE.to_string(), json!(content_type.as_str()));
            }
            if let Some(secret) = &self.cdi_import_secret_name {
                annotations.insert(cdi::IMPORT_SECRET_NAME.to_string(), json!(secret));
            }
            labels.insert(cdi::APP_LABEL.to_string(), json!(cdi::APP_LABEL_VALUE));
        }

        if !annotations.is_empty() {
            set_path(&mut claim, &["metadata", "annotations"], Value::Object(annotations));
        }
        if !labels.is_empty() {
            set_path(&mut claim, &["metadata", "labels"], Value::Object(labels));
        }

        let spec_fields = [
            ("selector", self.selector.clone()),
            ("accessModes", self.access_modes.as_ref().map(|m| json!(m))),
            ("resources", self.resources.clone()),
            ("storageClassName", self.storage_class_name.as_ref().map(|s| json!(s))),
            ("volumeMode", self.volume_mode.as_ref().map(|s| json!(s))),
            ("volumeName", self.volume_name.as_ref().map(|s| json!(s))),
        ];
        for (key, value) in spec_fields {
            if let Some(value) = value {
                set_path(&mut claim, &["spec", key], value);
            }
        }

        Ok(claim)
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: PvcParams = args.parse()?;
    let definition = params.resource.definition()?;
    let (name, namespace) = params.resource.identity(&definition)?;
    let body = merge_values(definition, params.build()?);

    let accessor = ResourceAccessor::<PersistentVolumeClaim>::new(ctx.client.clone(), &namespace);
    let outcome = ensure_presence(
        &accessor,
        &name,
        &body,
        params.state,
        params.resource.force,
        ctx.check_mode,
    )
    .await?;
    let outcome = settle(ctx, &accessor, outcome, params.wait, params.wait_timeout).await?;

    Ok(ModuleOutput::new(outcome.changed(), outcome.result()?))
}

/// Wait for a freshly created claim to be bound (and imported, for CDI claims)
pub async fn settle(
    ctx: &ModuleContext,
    accessor: &ResourceAccessor<PersistentVolumeClaim>,
    outcome: Outcome<PersistentVolumeClaim>,
    wait: bool,
    wait_timeout: u64,
) -> Result<Outcome<PersistentVolumeClaim>> {
    if !wait || ctx.check_mode || outcome.action != Action::Create {
        return Ok(outcome);
    }
    let Some(name) = outcome.object.as_ref().and_then(|o| o.metadata.name.clone()) else {
        return Ok(outcome);
    };

    info!("Waiting for claim {} to become ready", name);
    let ready = await_object(accessor.api(), &name, wait_timeout, pvc_ready()).await?;
    Ok(Outcome {
        action: outcome.action,
        object: Some(ready),
    })
}
