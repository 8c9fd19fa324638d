// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Conditions for [`await_object`](super::wait::await_object).

use super::wait::Readiness;
use crate::constants::{cdi, phase};
use crate::types::{VirtualMachine, VirtualMachineInstance, VirtualMachineInstanceReplicaSet};
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::api::ObjectMeta;

/// `readyReplicas` equals `desired`; an absent count satisfies zero, and so does
/// the replica set going away
pub fn replicas_ready(desired: i32) -> impl Fn(Option<&VirtualMachineInstanceReplicaSet>) -> Readiness {
    move |rs| match rs {
        Some(rs) if rs.has_ready_replicas(desired) => Readiness::Ready,
        None if desired == 0 => Readiness::Ready,
        _ => Readiness::Pending,
    }
}

/// `Running` is ready; `Failed` is terminal
pub fn vmi_running() -> impl Fn(Option<&VirtualMachineInstance>) -> Readiness {
    |vmi| {
        let Some(vmi) = vmi else {
            return Readiness::Pending;
        };
        if vmi.phase() == Some(phase::FAILED) {
            Readiness::Failed(format!(
                "VirtualMachineInstance {} failed to start",
                vmi.metadata.name.as_deref().unwrap_or_default()
            ))
        } else if vmi.is_running() {
            Readiness::Ready
        } else {
            Readiness::Pending
        }
    }
}

/// No instance reported; a deleted VM is stopped too
pub fn vm_stopped() -> impl Fn(Option<&VirtualMachine>) -> Readiness {
    |vm| match vm {
        Some(vm) if !vm.is_stopped() => Readiness::Pending,
        _ => Readiness::Ready,
    }
}

/// Bound, and for CDI imports also imported; `Failed` ends the wait either way
pub fn pvc_ready() -> impl Fn(Option<&PersistentVolumeClaim>) -> Readiness {
    |pvc| {
        let Some(pvc) = pvc else {
            return Readiness::Pending;
        };
        let claim_phase = pvc.status.as_ref().and_then(|s| s.phase.as_deref());
        match claim_phase {
            Some(phase::FAILED) => Readiness::Failed(format!(
                "PersistentVolumeClaim {} failed",
                pvc.metadata.name.as_deref().unwrap_or_default()
            )),
            Some(phase::BOUND) if !uses_cdi(&pvc.metadata) => Readiness::Ready,
            Some(phase::BOUND) => match import_phase(&pvc.metadata) {
                Some(phase::SUCCEEDED) => Readiness::Ready,
                Some(phase::FAILED) => Readiness::Failed(format!(
                    "CDI import into {} failed",
                    pvc.metadata.name.as_deref().unwrap_or_default()
                )),
                _ => Readiness::Pending,
            },
            _ => Readiness::Pending,
        }
    }
}

/// The claim carries an import endpoint and the importer's app label
pub fn uses_cdi(meta: &ObjectMeta) -> bool {
    let has_endpoint = meta
        .annotations
        .as_ref()
        .is_some_and(|a| a.contains_key(cdi::IMPORT_ENDPOINT));
    let has_label = meta
        .labels
        .as_ref()
        .and_then(|l| l.get(cdi::APP_LABEL))
        .is_some_and(|v| v == cdi::APP_LABEL_VALUE);
    has_endpoint && has_label
}

fn import_phase(meta: &ObjectMeta) -> Option<&str> {
    meta.annotations
        .as_ref()
        .and_then(|a| a.get(cdi::POD_PHASE))
        .map(String::as_str)
}
