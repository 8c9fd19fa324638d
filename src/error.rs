// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VirtError {
    #[error("Failed to {action} requested resource: {message}")]
    Api {
        action: &'static str,
        code: u16,
        reason: String,
        message: String,
    },

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to build client configuration: {0}")]
    KubeconfigError(String),

    #[error("{kind} {namespace}/{name} does not exist")]
    Missing {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("Invalid module arguments: {0}")]
    Validation(String),

    #[error("Error loading resource definition: {0}")]
    Definition(String),

    #[error("Timed out after {secs} seconds waiting for the resource. Try a higher wait_timeout value.")]
    Timeout { secs: u64 },

    #[error("{0}")]
    TerminalFailure(String),

    #[error("Failed to upload image: {message}")]
    Upload { status: Option<u16>, message: String },

    #[error("Failed to (de)serialize resource: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for VirtError {
    fn from(err: reqwest::Error) -> Self {
        VirtError::Upload {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl VirtError {
    /// Map a kube error for `action`, keeping the server-provided reason when there is one.
    pub fn from_kube(action: &'static str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => VirtError::Api {
                action,
                code: resp.code,
                reason: resp.reason,
                message: resp.message,
            },
            other => VirtError::KubeError(other),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            VirtError::Api { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            VirtError::Api { code, .. } => Some(*code),
            VirtError::Upload { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VirtError>;
