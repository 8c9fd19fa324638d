// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client creation from explicit connection settings

use crate::config::ConnectionConfig;
use crate::error::{Result, VirtError};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use serde_json::json;
use tracing::{debug, info, instrument};

const INLINE_NAME: &str = "virtstate";

/// Create a Kubernetes client for the given connection settings
#[instrument(skip(connection), fields(host = connection.host.as_deref().unwrap_or("<kubeconfig>")))]
pub async fn create_client(connection: &ConnectionConfig) -> Result<Client> {
    let config = resolve_config(connection).await?;
    info!("Connecting to {}", config.cluster_url);

    Client::try_from(config)
        .map_err(|e| VirtError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Resolve a kube config: explicit host first, then a kubeconfig file, then inference
pub async fn resolve_config(connection: &ConnectionConfig) -> Result<KConfig> {
    let options = KubeConfigOptions {
        context: connection.context.clone(),
        ..Default::default()
    };

    let mut config = if connection.host.is_some() {
        debug!("Using explicit host settings");
        let kubeconfig = inline_kubeconfig(connection)?;
        KConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                VirtError::KubeconfigError(format!("Failed to create config: {}", e))
            })?
    } else if let Some(path) = &connection.kubeconfig {
        debug!("Loading kubeconfig from {}", path.display());
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            VirtError::KubeconfigError(format!(
                "Failed to read kubeconfig file {}: {}",
                path.display(),
                e
            ))
        })?;
        KConfig::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| {
                VirtError::KubeconfigError(format!("Failed to create config: {}", e))
            })?
    } else if connection.context.is_some() {
        KConfig::from_kubeconfig(&options).await.map_err(|e| {
            VirtError::KubeconfigError(format!("Failed to load kubeconfig: {}", e))
        })?
    } else {
        KConfig::infer()
            .await
            .map_err(|e| VirtError::KubeconfigError(format!("Failed to infer config: {}", e)))?
    };

    // Explicit credentials win over whatever the kubeconfig carried
    if let Some(token) = &connection.api_key {
        config.auth_info.token = Some(token.clone().into());
    }
    if let Some(username) = &connection.username {
        config.auth_info.username = Some(username.clone());
    }
    if let Some(password) = &connection.password {
        config.auth_info.password = Some(password.clone().into());
    }
    if !connection.verify_ssl() {
        config.accept_invalid_certs = true;
    }

    Ok(config)
}

/// Build a single-context kubeconfig from `host` and the explicit credentials
fn inline_kubeconfig(connection: &ConnectionConfig) -> Result<Kubeconfig> {
    let path = |p: &Option<std::path::PathBuf>| p.as_ref().map(|p| p.display().to_string());

    let document = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": INLINE_NAME,
            "cluster": {
                "server": connection.host,
                "certificate-authority": path(&connection.ssl_ca_cert),
                "insecure-skip-tls-verify": !connection.verify_ssl(),
            }
        }],
        "users": [{
            "name": INLINE_NAME,
            "user": {
                "token": connection.api_key,
                "username": connection.username,
                "password": connection.password,
                "client-certificate": path(&connection.cert_file),
                "client-key": path(&connection.key_file),
            }
        }],
        "contexts": [{
            "name": INLINE_NAME,
            "context": { "cluster": INLINE_NAME, "user": INLINE_NAME }
        }],
        "current-context": INLINE_NAME,
    });

    serde_json::from_value(strip_nulls(document))
        .map_err(|e| VirtError::KubeconfigError(format!("Failed to build kubeconfig: {}", e)))
}

fn strip_nulls(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k, strip_nulls(v)))
            .collect(),
        serde_json::Value::Array(items) => items.into_iter().map(strip_nulls).collect(),
        other => other,
    }
}
