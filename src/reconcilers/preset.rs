// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `preset`: VirtualMachineInstancePresets.

use super::decision::Presence;
use super::presence::{ensure_presence, ResourceParams};
use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::definition::{merge_values, set_path};
use crate::error::Result;
use crate::kubernetes::ResourceAccessor;
use crate::types::{ModuleOutput, VirtualMachineInstancePreset};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct PresetParams {
    #[serde(default)]
    state: Presence,
    #[serde(flatten)]
    resource: ResourceParams,
    selector: Option<Value>,
    memory: Option<String>,
    machine_type: Option<String>,
    labels: Option<Map<String, Value>>,
}

impl PresetParams {
    fn build(&self) -> Value {
        let mut preset = json!({"spec": {"domain": {"devices": {}}}});
        if let Some(labels) = &self.labels {
            set_path(&mut preset, &["metadata", "labels"], Value::Object(labels.clone()));
        }
        if let Some(selector) = &self.selector {
            set_path(&mut preset, &["spec", "selector"], selector.clone());
        }
        if let Some(memory) = &self.memory {
            set_path(
                &mut preset,
                &["spec", "domain", "resources", "requests", "memory"],
                json!(memory),
            );
        }
        if let Some(machine_type) = &self.machine_type {
            set_path(&mut preset, &["spec", "domain", "machine", "type"], json!(machine_type));
        }
        preset
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: PresetParams = args.parse()?;
    let definition = params.resource.definition()?;
    let (name, namespace) = params.resource.identity(&definition)?;
    let body = merge_values(definition, params.build());

    let accessor = ResourceAccessor::<VirtualMachineInstancePreset>::new(ctx.client.clone(), &namespace);
    let outcome = ensure_presence(
        &accessor,
        &name,
        &body,
        params.state,
        params.resource.force,
        ctx.check_mode,
    )
    .await?;

    let result = outcome.result()?;
    Ok(ModuleOutput::new(outcome.changed(), result.clone()).with("kubevirt_preset", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{object_json, MockService};

    fn args(value: Value) -> ModuleArgs {
        ModuleArgs::from_value(value).unwrap()
    }

    #[test]
    fn test_devices_always_present() {
        let params: PresetParams = args(json!({"name": "vmi-preset-small", "namespace": "vms"}))
            .parse()
            .unwrap();
        assert_eq!(params.build(), json!({"spec": {"domain": {"devices": {}}}}));
    }

    #[test]
    fn test_build_from_flat_parameters() {
        let params: PresetParams = args(json!({
            "name": "vmi-preset-small",
            "namespace": "vms",
            "memory": "64M",
            "machine_type": "q35",
            "labels": {"team": "virt"},
            "selector": {"matchLabels": {"kubevirt.io/vmPreset": "vmi-preset-small"}}
        }))
        .parse()
        .unwrap();

        assert_eq!(
            params.build(),
            json!({
                "metadata": {"labels": {"team": "virt"}},
                "spec": {
                    "selector": {"matchLabels": {"kubevirt.io/vmPreset": "vmi-preset-small"}},
                    "domain": {
                        "devices": {},
                        "resources": {"requests": {"memory": "64M"}},
                        "machine": {"type": "q35"}
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn test_result_exposed_under_preset_key() {
        let path = "/apis/kubevirt.io/v1/namespaces/vms/virtualmachineinstancepresets";
        let preset = object_json(
            "kubevirt.io/v1",
            "VirtualMachineInstancePreset",
            "vms",
            "vmi-preset-small",
            "1",
            json!({"domain": {"devices": {}}}),
            None,
        );
        let mock = MockService::new().on_post(path, 201, &preset);
        let ctx = ModuleContext {
            client: mock.clone().into_client(),
            check_mode: false,
        };

        let output = run(&ctx, &args(json!({"name": "vmi-preset-small", "namespace": "vms"})))
            .await
            .unwrap();

        assert!(output.changed);
        assert_eq!(output.extra["kubevirt_preset"], output.result);
        assert_eq!(output.result["spec"]["domain"], json!({"devices": {}}));
    }
}
