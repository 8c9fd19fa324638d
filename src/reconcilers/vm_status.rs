// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `vm-status`: start or stop an existing VirtualMachine through `spec.running`.

use super::decision::{decide_running, Action};
use super::presence::ResourceParams;
use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::constants::wait::VM_TIMEOUT_SECS;
use crate::error::Result;
use crate::kubernetes::conditions::{vm_stopped, vmi_running};
use crate::kubernetes::{await_object, ResourceAccessor};
use crate::types::{ModuleOutput, VirtualMachine, VirtualMachineInstance};
use kube::{Api, ResourceExt};
use serde::Deserialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    #[default]
    Running,
    Stopped,
}

impl PowerState {
    pub fn is_running(&self) -> bool {
        matches!(self, PowerState::Running)
    }
}

#[derive(Debug, Deserialize)]
struct VmStatusParams {
    #[serde(default)]
    state: PowerState,
    #[serde(flatten)]
    resource: ResourceParams,
    resource_version: Option<String>,
    #[serde(default)]
    wait: bool,
    #[serde(default = "default_wait_timeout")]
    wait_timeout: u64,
}

fn default_wait_timeout() -> u64 {
    VM_TIMEOUT_SECS
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: VmStatusParams = args.parse()?;
    let definition = params.resource.definition()?;
    let (name, namespace) = params.resource.identity(&definition)?;

    let (changed, vm) = set_power(
        ctx,
        &namespace,
        &name,
        params.state,
        params.resource_version.as_deref(),
    )
    .await?;

    if changed && params.wait && !ctx.check_mode {
        await_power(ctx, &namespace, &name, params.state, params.wait_timeout).await?;
    }

    Ok(ModuleOutput::new(changed, serde_json::to_value(&vm)?))
}

/// Patch `spec.running` when it differs from `desired`.
///
/// A `resource_version` that no longer matches the live object makes this a no-op.
pub async fn set_power(
    ctx: &ModuleContext,
    namespace: &str,
    name: &str,
    desired: PowerState,
    resource_version: Option<&str>,
) -> Result<(bool, VirtualMachine)> {
    let vms = ResourceAccessor::<VirtualMachine>::new(ctx.client.clone(), namespace);
    let existing = vms.get_existing(name).await?;

    if let Some(expected) = resource_version {
        if existing.resource_version().as_deref() != Some(expected) {
            debug!(
                "VirtualMachine {} is at {:?}, not {}; leaving it alone",
                name,
                existing.resource_version(),
                expected
            );
            return Ok((false, existing));
        }
    }

    match decide_running(existing.is_running(), desired.is_running()) {
        Action::Patch(_) if ctx.check_mode => Ok((true, existing)),
        Action::Patch(patch) => {
            info!("Setting VirtualMachine {}/{} to {:?}", namespace, name, desired);
            Ok((true, vms.patch(name, &patch).await?))
        }
        _ => Ok((false, existing)),
    }
}

/// Wait for the instance to run, or for the VM to report it gone
pub async fn await_power(
    ctx: &ModuleContext,
    namespace: &str,
    name: &str,
    desired: PowerState,
    timeout_secs: u64,
) -> Result<()> {
    match desired {
        PowerState::Running => {
            let vmis: Api<VirtualMachineInstance> = Api::namespaced(ctx.client.clone(), namespace);
            await_object(&vmis, name, timeout_secs, vmi_running()).await?;
        }
        PowerState::Stopped => {
            let vms: Api<VirtualMachine> = Api::namespaced(ctx.client.clone(), namespace);
            await_object(&vms, name, timeout_secs, vm_stopped()).await?;
        }
    }
    Ok(())
}
