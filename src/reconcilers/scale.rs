// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `scale-vmirs`: set the replica count of an existing VirtualMachineInstanceReplicaSet.

use super::decision::{decide_replicas, Action};
use super::presence::ResourceParams;
use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::constants::wait::SCALE_TIMEOUT_SECS;
use crate::error::{Result, VirtError};
use crate::kubernetes::conditions::replicas_ready;
use crate::kubernetes::{await_object, ResourceAccessor};
use crate::types::{ModuleOutput, VirtualMachineInstanceReplicaSet};
use kube::ResourceExt;
use serde::Deserialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct ScaleParams {
    #[serde(flatten)]
    resource: ResourceParams,
    replicas: i32,
    resource_version: Option<String>,
    #[serde(default = "default_wait")]
    wait: bool,
    #[serde(default = "default_wait_timeout")]
    wait_timeout: u64,
}

fn default_wait() -> bool {
    true
}

fn default_wait_timeout() -> u64 {
    SCALE_TIMEOUT_SECS
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: ScaleParams = args.parse()?;
    if params.replicas < 0 {
        return Err(VirtError::Validation("replicas must not be negative".to_string()));
    }
    let definition = params.resource.definition()?;
    let (name, namespace) = params.resource.identity(&definition)?;

    let accessor = ResourceAccessor::<VirtualMachineInstanceReplicaSet>::new(ctx.client.clone(), &namespace);
    let existing = accessor.get_existing(&name).await?;

    if let Some(expected) = params.resource_version.as_deref() {
        if existing.resource_version().as_deref() != Some(expected) {
            debug!("{} changed since {}, not scaling", name, expected);
            return Ok(ModuleOutput::new(false, serde_json::to_value(&existing)?));
        }
    }

    let current = existing.spec.replicas.ok_or_else(|| {
        VirtError::Validation(format!(
            "{} has no spec.replicas; it cannot be scaled",
            name
        ))
    })?;

    let patch = match decide_replicas(current, params.replicas) {
        Action::Patch(patch) => patch,
        _ => return Ok(ModuleOutput::new(false, serde_json::to_value(&existing)?)),
    };
    if ctx.check_mode {
        return Ok(ModuleOutput::new(true, serde_json::to_value(&existing)?));
    }

    info!("Scaling {}/{} from {} to {}", namespace, name, current, params.replicas);
    let mut scaled = accessor.patch(&name, &patch).await?;

    if params.wait {
        scaled = await_object(
            accessor.api(),
            &name,
            params.wait_timeout,
            replicas_ready(params.replicas),
        )
        .await?;
    }

    Ok(ModuleOutput::new(true, serde_json::to_value(&scaled)?))
}
