// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Module arguments and connection settings.

use crate::constants::AUTH_ENV_PREFIX;
use crate::error::{Result, VirtError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::env;
use std::path::{Path, PathBuf};

const ANSIBLE_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";
const CHECK_MODE_KEY: &str = "_ansible_check_mode";

/// The flat parameter mapping a module is invoked with
#[derive(Debug, Clone, Default)]
pub struct ModuleArgs {
    values: Map<String, Value>,
}

impl ModuleArgs {
    /// Read arguments from a JSON or YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VirtError::Validation(format!("failed to read {}: {}", path.display(), e))
        })?;
        // JSON is valid YAML, so one parser covers both
        let value: Value = serde_yaml::from_str(&content).map_err(|e| {
            VirtError::Validation(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Self::from_value(value)
    }

    /// Build from an already parsed mapping, unwrapping `ANSIBLE_MODULE_ARGS` if present
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut values) = value else {
            return Err(VirtError::Validation(
                "module arguments must be a mapping".to_string(),
            ));
        };

        if let Some(Value::Object(inner)) = values.remove(ANSIBLE_ARGS_KEY) {
            values = inner;
        }

        Ok(Self { values })
    }

    pub fn check_mode(&self) -> bool {
        self.values
            .get(CHECK_MODE_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Deserialize the module-specific parameter struct, ignoring `_ansible_*` keys
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        let params: Map<String, Value> = self
            .values
            .iter()
            .filter(|(k, v)| !k.starts_with("_ansible_") && !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        serde_json::from_value(Value::Object(params))
            .map_err(|e| VirtError::Validation(e.to_string()))
    }
}

/// Credentials and endpoint selection, resolved once and passed to client creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_ssl: Option<bool>,
    pub ssl_ca_cert: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Take connection settings from the module arguments, falling back to `K8S_AUTH_*`
    pub fn from_args(args: &ModuleArgs) -> Result<Self> {
        let config: ConnectionConfig = args.parse()?;
        Ok(config.with_env_fallback(|key| env::var(key).ok()))
    }

    fn with_env_fallback(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(&format!("{}{}", AUTH_ENV_PREFIX, name.to_uppercase()));

        ConnectionConfig {
            kubeconfig: self.kubeconfig.or_else(|| var("kubeconfig").map(PathBuf::from)),
            context: self.context.or_else(|| var("context")),
            host: self.host.or_else(|| var("host")),
            api_key: self.api_key.or_else(|| var("api_key")),
            username: self.username.or_else(|| var("username")),
            password: self.password.or_else(|| var("password")),
            verify_ssl: self
                .verify_ssl
                .or_else(|| var("verify_ssl").and_then(|v| v.parse().ok())),
            ssl_ca_cert: self.ssl_ca_cert.or_else(|| var("ssl_ca_cert").map(PathBuf::from)),
            cert_file: self.cert_file.or_else(|| var("cert_file").map(PathBuf::from)),
            key_file: self.key_file.or_else(|| var("key_file").map(PathBuf::from)),
        }
    }

    /// TLS verification is on unless explicitly disabled
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct NameOnly {
        name: String,
        #[serde(default)]
        replicas: Option<i32>,
    }

    #[test]
    fn test_from_value_unwraps_ansible_args() {
        let args = ModuleArgs::from_value(json!({
            "ANSIBLE_MODULE_ARGS": {
                "name": "baldr",
                "_ansible_check_mode": true
            }
        }))
        .unwrap();

        assert!(args.check_mode());
        let params: NameOnly = args.parse().unwrap();
        assert_eq!(params.name, "baldr");
    }

    #[test]
    fn test_parse_ignores_internal_keys_and_nulls() {
        let args = ModuleArgs::from_value(json!({
            "name": "baldr",
            "replicas": null,
            "_ansible_verbosity": 3
        }))
        .unwrap();

        assert!(!args.check_mode());
        let params: NameOnly = args.parse().unwrap();
        assert_eq!(params.replicas, None);
    }

    #[test]
    fn test_parse_reports_validation_error() {
        let args = ModuleArgs::from_value(json!({"replicas": 2})).unwrap();
        let err = args.parse::<NameOnly>().unwrap_err();
        assert!(matches!(err, VirtError::Validation(_)));
    }

    #[test]
    fn test_from_value_rejects_non_mapping() {
        assert!(ModuleArgs::from_value(json!(["name"])).is_err());
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name: testvm\nreplicas: 3").unwrap();

        let args = ModuleArgs::from_file(file.path()).unwrap();
        let params: NameOnly = args.parse().unwrap();
        assert_eq!(params.name, "testvm");
        assert_eq!(params.replicas, Some(3));
    }

    #[test]
    fn test_connection_env_fallback() {
        let env = HashMap::from([
            ("K8S_AUTH_HOST".to_string(), "https://10.0.0.1:6443".to_string()),
            ("K8S_AUTH_VERIFY_SSL".to_string(), "false".to_string()),
            ("K8S_AUTH_API_KEY".to_string(), "from-env".to_string()),
        ]);
        let config = ConnectionConfig {
            api_key: Some("from-args".to_string()),
            ..Default::default()
        }
        .with_env_fallback(|key| env.get(key).cloned());

        assert_eq!(config.host.as_deref(), Some("https://10.0.0.1:6443"));
        assert_eq!(config.api_key.as_deref(), Some("from-args"));
        assert!(!config.verify_ssl());
    }

    #[test]
    fn test_verify_ssl_defaults_to_true() {
        assert!(ConnectionConfig::default().verify_ssl());
    }
}
