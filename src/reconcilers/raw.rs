// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `raw`: any supported kind, driven entirely by its definitions.

use super::decision::Presence;
use super::presence::{ensure_presence, Outcome, ResourceParams};
use super::{pvc, ModuleContext};
use crate::config::ModuleArgs;
use crate::constants::wait::PVC_TIMEOUT_SECS;
use crate::definition::{load_definitions, str_at};
use crate::error::{Result, VirtError};
use crate::kubernetes::{ManagedResource, ResourceAccessor};
use crate::types::{
    ModuleOutput, ResourceKind, VirtualMachine, VirtualMachineInstance,
    VirtualMachineInstancePreset, VirtualMachineInstanceReplicaSet,
};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct RawParams {
    kind: Option<String>,
    #[serde(default)]
    state: Presence,
    #[serde(flatten)]
    resource: ResourceParams,
    #[serde(default)]
    wait: bool,
    #[serde(default = "default_wait_timeout")]
    wait_timeout: u64,
}

fn default_wait_timeout() -> u64 {
    PVC_TIMEOUT_SECS
}

impl RawParams {
    /// Kind and identity of one definition; the definition wins, parameters fill gaps
    fn request(&self, body: Value) -> Result<Request> {
        let kind: ResourceKind = str_at(&body, &["kind"])
            .or(self.kind.as_deref())
            .ok_or_else(|| VirtError::Validation("kind is required".to_string()))?
            .parse()?;
        let name = str_at(&body, &["metadata", "name"])
            .or(self.resource.name.as_deref())
            .ok_or_else(|| VirtError::Validation("name is required".to_string()))?
            .to_string();
        let namespace = str_at(&body, &["metadata", "namespace"])
            .or(self.resource.namespace.as_deref())
            .ok_or_else(|| VirtError::Validation("namespace is required".to_string()))?
            .to_string();

        Ok(Request {
            kind,
            name,
            namespace,
            body,
            state: self.state,
            force: self.resource.force,
        })
    }
}

struct Request {
    kind: ResourceKind,
    name: String,
    namespace: String,
    body: Value,
    state: Presence,
    force: bool,
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: RawParams = args.parse()?;
    let mut definitions = load_definitions(
        params.resource.resource_definition.clone(),
        params.resource.src.as_deref(),
    )?;
    if definitions.is_empty() {
        definitions.push(json!({}));
    }

    // Validate every definition before touching the cluster
    let requests = definitions
        .into_iter()
        .map(|body| params.request(body))
        .collect::<Result<Vec<_>>>()?;
    debug!("Applying {} definition(s)", requests.len());

    let mut results = Vec::with_capacity(requests.len());
    for request in &requests {
        results.push(apply_one(ctx, &params, request).await?);
    }

    if results.len() == 1 {
        let (changed, result) = results.remove(0);
        return Ok(ModuleOutput::new(changed, result));
    }

    let changed = results.iter().any(|(changed, _)| *changed);
    let results: Vec<Value> = results
        .into_iter()
        .map(|(changed, result)| json!({"changed": changed, "result": result}))
        .collect();
    Ok(ModuleOutput::new(changed, json!({"results": results})))
}

async fn apply_one(ctx: &ModuleContext, params: &RawParams, request: &Request) -> Result<(bool, Value)> {
    match request.kind {
        ResourceKind::VirtualMachine => summarize(apply::<VirtualMachine>(ctx, request).await?),
        ResourceKind::VirtualMachineInstance => {
            summarize(apply::<VirtualMachineInstance>(ctx, request).await?)
        }
        ResourceKind::VirtualMachineInstanceReplicaSet => {
            summarize(apply::<VirtualMachineInstanceReplicaSet>(ctx, request).await?)
        }
        ResourceKind::VirtualMachineInstancePreset => {
            summarize(apply::<VirtualMachineInstancePreset>(ctx, request).await?)
        }
        ResourceKind::Service => summarize(apply::<Service>(ctx, request).await?),
        ResourceKind::PersistentVolumeClaim => {
            let accessor =
                ResourceAccessor::<PersistentVolumeClaim>::new(ctx.client.clone(), &request.namespace);
            let outcome = ensure_presence(
                &accessor,
                &request.name,
                &request.body,
                request.state,
                request.force,
                ctx.check_mode,
            )
            .await?;
            let outcome = pvc::settle(ctx, &accessor, outcome, params.wait, params.wait_timeout).await?;
            summarize(outcome)
        }
    }
}

async fn apply<K: ManagedResource>(ctx: &ModuleContext, request: &Request) -> Result<Outcome<K>> {
    let accessor = ResourceAccessor::<K>::new(ctx.client.clone(), &request.namespace);
    ensure_presence(
        &accessor,
        &request.name,
        &request.body,
        request.state,
        request.force,
        ctx.check_mode,
    )
    .await
}

fn summarize<K: ManagedResource>(outcome: Outcome<K>) -> Result<(bool, Value)> {
    Ok((outcome.changed(), outcome.result()?))
}
