// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! KubeVirt custom resources. Only the fields the reconcilers compare are typed;
//! everything else is carried through untouched in `fields`.

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::phase;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "kubevirt.io", version = "v1", kind = "VirtualMachine")]
#[kube(namespaced, plural = "virtualmachines")]
#[kube(status = "VirtualMachineStatus")]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl VirtualMachine {
    /// The requested power state; an unset `spec.running` counts as stopped
    pub fn is_running(&self) -> bool {
        self.spec.running.unwrap_or(false)
    }

    /// True once neither `status.created` nor `status.ready` reports an instance
    pub fn is_stopped(&self) -> bool {
        self.status
            .as_ref()
            .map_or(true, |s| !s.created.unwrap_or(false) && !s.ready.unwrap_or(false))
    }
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "kubevirt.io", version = "v1", kind = "VirtualMachineInstance")]
#[kube(namespaced, plural = "virtualmachineinstances")]
#[kube(status = "VirtualMachineInstanceStatus")]
pub struct VirtualMachineInstanceSpec {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl VirtualMachineInstance {
    pub fn phase(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.phase.as_deref())
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Some(phase::RUNNING)
    }
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachineInstanceReplicaSet"
)]
#[kube(namespaced, plural = "virtualmachineinstancereplicasets")]
#[kube(status = "VirtualMachineInstanceReplicaSetStatus")]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceReplicaSetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceReplicaSetStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<i32>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl VirtualMachineInstanceReplicaSet {
    /// Ready replica count, where an absent or null `readyReplicas` counts as zero
    pub fn ready_replicas(&self) -> i32 {
        self.status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0)
    }

    pub fn has_ready_replicas(&self, desired: i32) -> bool {
        self.ready_replicas() == desired
    }
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachineInstancePreset"
)]
#[kube(namespaced, plural = "virtualmachineinstancepresets")]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstancePresetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Value>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}
