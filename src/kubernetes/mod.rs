// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, resource access and waiting.

pub mod accessor;
pub mod client;
pub mod conditions;
pub mod wait;

pub use accessor::{ManagedResource, ResourceAccessor};
pub use client::create_client;
pub use wait::{await_object, Readiness};
