// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Containerized Data Importer annotation and label keys
pub mod cdi {
    /// Source URL of an import; its presence marks the claim as a CDI import
    pub const IMPORT_ENDPOINT: &str = "cdi.kubevirt.io/storage.import.endpoint";
    pub const IMPORT_SOURCE: &str = "cdi.kubevirt.io/storage.import.source";
    pub const IMPORT_SECRET_NAME: &str = "cdi.kubevirt.io/storage.import.secretName";
    pub const CONTENT_TYPE: &str = "cdi.kubevirt.io/storage.contentType";
    /// Phase of the importer pod, reported back on the claim
    pub const POD_PHASE: &str = "cdi.kubevirt.io/storage.pod.phase";

    pub const APP_LABEL: &str = "app";
    pub const APP_LABEL_VALUE: &str = "containerized-data-importer";

    pub const DEFAULT_IMPORT_SOURCE: &str = "http";

    /// Upload proxy API version, also the first path segment of the upload endpoint
    pub const UPLOAD_API_VERSION: &str = "v1alpha1";
    /// Multipart field carrying the image
    pub const UPLOAD_FORM_FIELD: &str = "file";
}

/// Status phases the wait loop reacts to
pub mod phase {
    pub const RUNNING: &str = "Running";
    pub const BOUND: &str = "Bound";
    pub const FAILED: &str = "Failed";
    pub const SUCCEEDED: &str = "Succeeded";
}

/// Wait configuration
pub mod wait {
    /// The API server rejects watch timeouts of 295 seconds and above
    pub const MAX_WATCH_TIMEOUT_SECS: u32 = 290;
    /// Pause before reopening a watch the server closed
    pub const WATCH_RESTART_DELAY_SECS: u64 = 1;
    pub const VM_TIMEOUT_SECS: u64 = 120;
    pub const SCALE_TIMEOUT_SECS: u64 = 20;
    pub const PVC_TIMEOUT_SECS: u64 = 300;
}

/// Names given to the cloud-init disk and volume added for `cloud_init_nocloud`
pub mod cloud_init {
    pub const VOLUME_NAME: &str = "ansiblecloudinitvolume";
    pub const DISK_NAME: &str = "ansiblecloudinitdisk";
}

/// Environment prefix for connection settings, e.g. `K8S_AUTH_KUBECONFIG`
pub const AUTH_ENV_PREFIX: &str = "K8S_AUTH_";
