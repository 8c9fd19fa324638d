// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `service`: Services exposing VMs.

use super::decision::Presence;
use super::presence::{ensure_presence, ResourceParams};
use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::definition::{merge_values, set_path};
use crate::error::Result;
use crate::kubernetes::ResourceAccessor;
use crate::types::ModuleOutput;
use k8s_openapi::api::core::v1::Service;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
    ExternalName,
}

impl ServiceType {
    fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIP => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
            ServiceType::ExternalName => "ExternalName",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceParams {
    #[serde(default)]
    state: Presence,
    #[serde(flatten)]
    resource: ResourceParams,
    #[serde(default, rename = "type")]
    service_type: ServiceType,
    ports: Option<Vec<Value>>,
    selector: Option<Value>,
}

impl ServiceParams {
    fn build(&self) -> Value {
        let mut service = json!({"spec": {"type": self.service_type.as_str()}});
        if let Some(ports) = &self.ports {
            set_path(&mut service, &["spec", "ports"], json!(ports));
        }
        if let Some(selector) = &self.selector {
            set_path(&mut service, &["spec", "selector"], selector.clone());
        }
        service
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: ServiceParams = args.parse()?;
    let definition = params.resource.definition()?;
    let (name, namespace) = params.resource.identity(&definition)?;
    // The definition overrides the flat parameters here
    let body = merge_values(params.build(), definition);

    let accessor = ResourceAccessor::<Service>::new(ctx.client.clone(), &namespace);
    let outcome = ensure_presence(
        &accessor,
        &name,
        &body,
        params.state,
        params.resource.force,
        ctx.check_mode,
    )
    .await?;

    Ok(ModuleOutput::new(outcome.changed(), outcome.result()?))
}
