// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Containerized Data Importer upload API.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Asks the upload proxy for a short-lived token scoped to one claim
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "upload.cdi.kubevirt.io", version = "v1alpha1", kind = "UploadTokenRequest")]
#[kube(namespaced, plural = "uploadtokenrequests")]
#[kube(status = "UploadTokenRequestStatus")]
#[serde(rename_all = "camelCase")]
pub struct UploadTokenRequestSpec {
    pub pvc_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
pub struct UploadTokenRequestStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UploadTokenRequest {
    pub fn token(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.token.as_deref())
    }
}
