// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `vm`: VirtualMachines, or bare VirtualMachineInstances when ephemeral.

use super::decision::Presence;
use super::presence::{ensure_presence, ResourceParams};
use super::vm_status::{await_power, set_power, PowerState};
use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::constants::wait::VM_TIMEOUT_SECS;
use crate::definition::{merge_values, set_path, TemplateParams};
use crate::error::{Result, VirtError};
use crate::kubernetes::ResourceAccessor;
use crate::types::{ModuleOutput, VirtualMachine, VirtualMachineInstance};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum VmState {
    #[default]
    Present,
    Absent,
    Running,
    Stopped,
}

impl VmState {
    fn presence(&self) -> Presence {
        match self {
            VmState::Absent => Presence::Absent,
            _ => Presence::Present,
        }
    }

    fn power(&self) -> Option<PowerState> {
        match self {
            VmState::Running => Some(PowerState::Running),
            VmState::Stopped => Some(PowerState::Stopped),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VmParams {
    #[serde(default)]
    state: VmState,
    #[serde(flatten)]
    resource: ResourceParams,
    #[serde(flatten)]
    template: TemplateParams,
    #[serde(default)]
    ephemeral: bool,
    #[serde(default = "default_wait")]
    wait: bool,
    #[serde(default = "default_wait_timeout")]
    wait_timeout: u64,
}

fn default_wait() -> bool {
    true
}

fn default_wait_timeout() -> u64 {
    VM_TIMEOUT_SECS
}

impl VmParams {
    fn validate(&self) -> Result<()> {
        if self.ephemeral && self.state.power().is_some() {
            return Err(VirtError::Validation(
                "an ephemeral VM only supports state present or absent".to_string(),
            ));
        }
        Ok(())
    }

    /// The VirtualMachine body, or the instance body when ephemeral
    fn build(&self) -> Result<Value> {
        let template = self.template.build()?;

        if self.ephemeral {
            return Ok(template);
        }

        let mut vm = json!({"spec": {"running": self.state == VmState::Running}});
        if template != json!({}) {
            set_path(&mut vm, &["spec", "template"], template);
        }
        Ok(vm)
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: VmParams = args.parse()?;
    params.validate()?;
    let definition = params.resource.definition()?;
    let (name, namespace) = params.resource.identity(&definition)?;
    let body = merge_values(definition, params.build()?);

    if params.ephemeral {
        let vmis = ResourceAccessor::<VirtualMachineInstance>::new(ctx.client.clone(), &namespace);
        let outcome = ensure_presence(
            &vmis,
            &name,
            &body,
            params.state.presence(),
            params.resource.force,
            ctx.check_mode,
        )
        .await?;
        let result = outcome.result()?;
        return Ok(ModuleOutput::new(outcome.changed(), result.clone()).with("kubevirt_vm", result));
    }

    let vms = ResourceAccessor::<VirtualMachine>::new(ctx.client.clone(), &namespace);
    let outcome = ensure_presence(
        &vms,
        &name,
        &body,
        params.state.presence(),
        params.resource.force,
        ctx.check_mode,
    )
    .await?;
    let mut changed = outcome.changed();
    let mut result = outcome.result()?;

    if let Some(power) = params.state.power() {
        if ctx.check_mode && outcome.object.is_none() {
            debug!("Check mode: {} would be created with running={}", name, power.is_running());
        } else {
            let (toggled, vm) = set_power(ctx, &namespace, &name, power, None).await?;
            changed |= toggled;
            result = serde_json::to_value(&vm)?;
        }

        // Also covers a VM just created in the requested power state
        if changed && params.wait && !ctx.check_mode {
            await_power(ctx, &namespace, &name, power, params.wait_timeout).await?;
        }
    }

    Ok(ModuleOutput::new(changed, result.clone()).with("kubevirt_vm", result))
}
