// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired-vs-observed decisions. Pure functions over freshly fetched state.

use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create,
    Replace,
    Delete,
    /// JSON merge patch body
    Patch(Value),
    NoOp,
}

impl Action {
    pub fn changes(&self) -> bool {
        !matches!(self, Action::NoOp)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    #[default]
    Present,
    Absent,
}

pub fn decide_presence(exists: bool, desired: Presence, force: bool) -> Action {
    match (exists, desired) {
        (false, Presence::Present) => Action::Create,
        (true, Presence::Present) if force => Action::Replace,
        (true, Presence::Absent) => Action::Delete,
        _ => Action::NoOp,
    }
}

pub fn decide_running(current: bool, desired: bool) -> Action {
    if current == desired {
        Action::NoOp
    } else {
        Action::Patch(json!({"spec": {"running": desired}}))
    }
}

pub fn decide_replicas(current: i32, desired: i32) -> Action {
    if current == desired {
        Action::NoOp
    } else {
        Action::Patch(json!({"spec": {"replicas": desired}}))
    }
}
