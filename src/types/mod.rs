// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource types, the kind dispatch enum and module result documents.

pub mod cdi;
pub mod kind;
pub mod kubevirt;
pub mod output;

pub use cdi::UploadTokenRequest;
pub use kind::ResourceKind;
pub use kubevirt::{
    VirtualMachine, VirtualMachineInstance, VirtualMachineInstancePreset,
    VirtualMachineInstanceReplicaSet,
};
pub use output::{FailureOutput, ModuleOutput};
