// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `facts`: read-only lookup of one object or a filtered list.

use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::definition::prune_empty;
use crate::error::{Result, VirtError};
use crate::kubernetes::{ManagedResource, ResourceAccessor};
use crate::types::{
    ModuleOutput, ResourceKind, VirtualMachine, VirtualMachineInstance,
    VirtualMachineInstancePreset, VirtualMachineInstanceReplicaSet,
};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use kube::api::ListParams;
use kube::Api;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct FactsParams {
    kind: String,
    name: Option<String>,
    namespace: Option<String>,
    #[serde(default)]
    label_selectors: Vec<String>,
    #[serde(default)]
    field_selectors: Vec<String>,
}

impl FactsParams {
    fn list_params(&self) -> ListParams {
        let mut lp = ListParams::default();
        if !self.label_selectors.is_empty() {
            lp = lp.labels(&self.label_selectors.join(","));
        }
        if !self.field_selectors.is_empty() {
            lp = lp.fields(&self.field_selectors.join(","));
        }
        lp
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: FactsParams = args.parse()?;
    let kind: ResourceKind = params.kind.parse()?;
    if params.name.is_some() && params.namespace.is_none() {
        return Err(VirtError::Validation(
            "namespace is required when name is given".to_string(),
        ));
    }

    let resources = match kind {
        ResourceKind::VirtualMachine => lookup::<VirtualMachine>(ctx, &params).await?,
        ResourceKind::VirtualMachineInstance => lookup::<VirtualMachineInstance>(ctx, &params).await?,
        ResourceKind::VirtualMachineInstanceReplicaSet => {
            lookup::<VirtualMachineInstanceReplicaSet>(ctx, &params).await?
        }
        ResourceKind::VirtualMachineInstancePreset => {
            lookup::<VirtualMachineInstancePreset>(ctx, &params).await?
        }
        ResourceKind::PersistentVolumeClaim => lookup::<PersistentVolumeClaim>(ctx, &params).await?,
        ResourceKind::Service => lookup::<Service>(ctx, &params).await?,
    };
    debug!("Found {} {} object(s)", resources.len(), kind);

    let resources = Value::Array(resources);
    Ok(ModuleOutput::new(false, json!({"items": resources.clone()})).with("resources", resources))
}

async fn lookup<K: ManagedResource>(ctx: &ModuleContext, params: &FactsParams) -> Result<Vec<Value>> {
    let objects: Vec<K> = match (&params.name, &params.namespace) {
        (Some(name), Some(namespace)) => ResourceAccessor::<K>::new(ctx.client.clone(), namespace)
            .get(name)
            .await?
            .into_iter()
            .collect(),
        (None, Some(namespace)) => {
            ResourceAccessor::<K>::new(ctx.client.clone(), namespace)
                .list(&params.list_params())
                .await?
        }
        _ => {
            let api: Api<K> = Api::all(ctx.client.clone());
            api.list(&params.list_params())
                .await
                .map_err(|e| VirtError::from_kube("list", e))?
                .items
        }
    };

    objects
        .iter()
        .map(|obj| Ok(prune_empty(serde_json::to_value(obj)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{object_value, MockService};

    fn ctx(mock: &MockService) -> ModuleContext {
        ModuleContext {
            client: mock.clone().into_client(),
            check_mode: false,
        }
    }

    fn args(value: Value) -> ModuleArgs {
        ModuleArgs::from_value(value).unwrap()
    }

    fn vmi(name: &str, namespace: &str) -> Value {
        object_value(
            "kubevirt.io/v1",
            "VirtualMachineInstance",
            namespace,
            name,
            "1",
            json!({"domain": {"devices": {}}, "hostname": ""}),
            Some(json!({"phase": "Running", "nodeName": null})),
        )
    }

    fn list(items: Vec<Value>) -> String {
        json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachineInstanceList",
            "metadata": {"resourceVersion": "10"},
            "items": items
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_single_object_is_pruned() {
        let mock = MockService::new().on_get(
            "/apis/kubevirt.io/v1/namespaces/vms/virtualmachineinstances/testvm",
            200,
            &vmi("testvm", "vms").to_string(),
        );

        let output = run(
            &ctx(&mock),
            &args(json!({"kind": "VirtualMachineInstance", "name": "testvm", "namespace": "vms"})),
        )
        .await
        .unwrap();

        assert!(!output.changed);
        let resources = output.extra["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 1);
        assert!(resources[0]["spec"].get("hostname").is_none());
        assert!(resources[0]["status"].get("nodeName").is_none());
        assert_eq!(output.result["items"], output.extra["resources"]);
    }

    #[tokio::test]
    async fn test_missing_object_is_empty_list() {
        let mock = MockService::new();

        let output = run(
            &ctx(&mock),
            &args(json!({"kind": "VirtualMachine", "name": "testvm", "namespace": "vms"})),
        )
        .await
        .unwrap();

        assert_eq!(output.extra["resources"], json!([]));
    }

    #[tokio::test]
    async fn test_namespace_list_passes_selectors() {
        let mock = MockService::new().on_get(
            "/apis/kubevirt.io/v1/namespaces/vms/virtualmachineinstances",
            200,
            &list(vec![vmi("a", "vms"), vmi("b", "vms")]),
        );

        let output = run(
            &ctx(&mock),
            &args(json!({
                "kind": "virtual_machine_instance",
                "namespace": "vms",
                "label_selectors": ["app=galaxy", "tier=web"],
                "field_selectors": ["status.phase=Running"]
            })),
        )
        .await
        .unwrap();

        assert_eq!(output.extra["resources"].as_array().unwrap().len(), 2);
        let query = &mock.requests_for("GET")[0].query;
        assert!(query.contains("labelSelector=app%3Dgalaxy%2Ctier%3Dweb"));
        assert!(query.contains("fieldSelector=status.phase%3DRunning"));
    }

    #[tokio::test]
    async fn test_all_namespaces_without_namespace() {
        let mock = MockService::new().on_get(
            "/apis/kubevirt.io/v1/virtualmachineinstances",
            200,
            &list(vec![vmi("a", "vms"), vmi("b", "default")]),
        );

        let output = run(&ctx(&mock), &args(json!({"kind": "VirtualMachineInstance"})))
            .await
            .unwrap();

        assert_eq!(output.extra["resources"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_name_requires_namespace() {
        let mock = MockService::new();

        let err = run(&ctx(&mock), &args(json!({"kind": "VirtualMachine", "name": "testvm"})))
            .await
            .unwrap_err();

        assert!(matches!(err, VirtError::Validation(_)));
        assert!(mock.requests().is_empty());
    }
}
