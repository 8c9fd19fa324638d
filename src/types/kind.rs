// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The closed set of resource kinds the reconcilers can manage.

use crate::error::VirtError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    VirtualMachine,
    VirtualMachineInstance,
    VirtualMachineInstanceReplicaSet,
    VirtualMachineInstancePreset,
    PersistentVolumeClaim,
    Service,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::VirtualMachine,
        ResourceKind::VirtualMachineInstance,
        ResourceKind::VirtualMachineInstanceReplicaSet,
        ResourceKind::VirtualMachineInstancePreset,
        ResourceKind::PersistentVolumeClaim,
        ResourceKind::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::VirtualMachine => "VirtualMachine",
            ResourceKind::VirtualMachineInstance => "VirtualMachineInstance",
            ResourceKind::VirtualMachineInstanceReplicaSet => "VirtualMachineInstanceReplicaSet",
            ResourceKind::VirtualMachineInstancePreset => "VirtualMachineInstancePreset",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ResourceKind::Service => "Service",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `VirtualMachine`, `virtualmachine` and `virtual_machine` alike.
impl FromStr for ResourceKind {
    type Err = VirtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| VirtError::Validation(format!("unsupported kind '{}'", s)))
    }
}
