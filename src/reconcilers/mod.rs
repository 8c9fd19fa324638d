// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Modules: parse parameters, compare against the cluster, act, optionally wait.

pub mod cdi_upload;
pub mod decision;
pub mod facts;
pub mod presence;
pub mod preset;
pub mod pvc;
pub mod raw;
pub mod replica_set;
pub mod scale;
pub mod service;
pub mod vm;
pub mod vm_status;

use crate::config::ModuleArgs;
use crate::error::Result;
use crate::types::ModuleOutput;
use kube::Client;
use tracing::instrument;

pub use decision::{Action, Presence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModuleName {
    /// Any supported kind from a definition
    Raw,
    Vm,
    /// Start or stop an existing VirtualMachine
    VmStatus,
    ReplicaSet,
    /// Scale an existing VirtualMachineInstanceReplicaSet
    ScaleVmirs,
    Preset,
    Pvc,
    Service,
    Facts,
    /// Upload a local image into a claim through the CDI upload proxy
    CdiUpload,
}

/// What every module run gets besides its parameters
pub struct ModuleContext {
    pub client: Client,
    pub check_mode: bool,
}

#[instrument(skip(client, args))]
pub async fn execute(module: ModuleName, client: Client, args: &ModuleArgs) -> Result<ModuleOutput> {
    let ctx = ModuleContext {
        client,
        check_mode: args.check_mode(),
    };

    match module {
        ModuleName::Raw => raw::run(&ctx, args).await,
        ModuleName::Vm => vm::run(&ctx, args).await,
        ModuleName::VmStatus => vm_status::run(&ctx, args).await,
        ModuleName::ReplicaSet => replica_set::run(&ctx, args).await,
        ModuleName::ScaleVmirs => scale::run(&ctx, args).await,
        ModuleName::Preset => preset::run(&ctx, args).await,
        ModuleName::Pvc => pvc::run(&ctx, args).await,
        ModuleName::Service => service::run(&ctx, args).await,
        ModuleName::Facts => facts::run(&ctx, args).await,
        ModuleName::CdiUpload => cdi_upload::run(&ctx, args).await,
    }
}
