// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Documents printed back to the caller.

use crate::error::VirtError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Successful module result: `{"changed": .., "result": .., <extra keys>}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOutput {
    pub changed: bool,
    pub result: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleOutput {
    pub fn new(changed: bool, result: Value) -> Self {
        Self {
            changed,
            result,
            extra: Map::new(),
        }
    }

    /// Attach a module-specific key, e.g. `kubevirt_rs`
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

/// Failure document: `{"failed": true, "msg": .., "reason": .., "status": ..}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureOutput {
    pub failed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FailureOutput {
    pub fn from_message(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: msg.into(),
            reason: None,
            status: None,
        }
    }
}

impl From<&VirtError> for FailureOutput {
    fn from(err: &VirtError) -> Self {
        Self {
            failed: true,
            msg: err.to_string(),
            reason: err.reason().map(str::to_string),
            status: err.status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_flattens_extra_keys() {
        let output = ModuleOutput::new(true, json!({"kind": "VirtualMachine"}))
            .with("kubevirt_vm", json!({"kind": "VirtualMachine"}));

        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "changed": true,
                "result": {"kind": "VirtualMachine"},
                "kubevirt_vm": {"kind": "VirtualMachine"}
            })
        );
    }

    #[test]
    fn test_failure_from_api_error() {
        let err = VirtError::Api {
            action: "create",
            code: 422,
            reason: "Invalid".to_string(),
            message: "spec.domain is required".to_string(),
        };

        assert_eq!(
            serde_json::to_value(FailureOutput::from(&err)).unwrap(),
            json!({
                "failed": true,
                "msg": "Failed to create requested resource: spec.domain is required",
                "reason": "Invalid",
                "status": 422
            })
        );
    }

    #[test]
    fn test_failure_without_api_details() {
        let err = VirtError::Validation("kind is required".to_string());
        let value = serde_json::to_value(FailureOutput::from(&err)).unwrap();
        assert_eq!(value, json!({"failed": true, "msg": "Invalid module arguments: kind is required"}));
    }
}
