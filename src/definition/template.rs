// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Flat VM parameters turned into a VirtualMachineInstance template.

use super::{push_at, set_path};
use crate::constants::cloud_init;
use crate::error::{Result, VirtError};
use serde::Deserialize;
use serde_json::{json, Map, Value};

const VOLUME_SUFFIX: &str = "volume";

/// Parameters shared by the `vm` and `replica-set` modules
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateParams {
    pub memory: Option<String>,
    pub machine_type: Option<String>,
    pub labels: Option<Map<String, Value>>,
    pub disks: Vec<Value>,
    pub interfaces: Vec<Value>,
    pub cloud_init_nocloud: Option<Value>,
}

impl TemplateParams {
    /// Build the `{metadata, spec}` template; only the given parameters appear in it.
    pub fn build(&self) -> Result<Value> {
        let mut template = json!({});

        if let Some(labels) = &self.labels {
            set_path(&mut template, &["metadata", "labels"], Value::Object(labels.clone()));
        }
        if let Some(memory) = &self.memory {
            set_path(
                &mut template,
                &["spec", "domain", "resources", "requests", "memory"],
                Value::String(memory.clone()),
            );
        }
        if let Some(machine_type) = &self.machine_type {
            set_path(
                &mut template,
                &["spec", "domain", "machine", "type"],
                Value::String(machine_type.clone()),
            );
        }

        for disk in &self.disks {
            let (name, mut disk) = named_entry(disk, "disk")?;
            let volume = take_mapping(&mut disk, "volume", "disk", &name)?;
            let volume_name = format!("{}{}", name, VOLUME_SUFFIX);

            disk.insert("volumeName".to_string(), Value::String(volume_name.clone()));
            push_at(&mut template, &["spec", "domain", "devices", "disks"], Value::Object(disk));
            push_at(&mut template, &["spec", "volumes"], with_name(volume, volume_name));
        }

        for interface in &self.interfaces {
            let (name, mut interface) = named_entry(interface, "interface")?;
            let network = take_mapping(&mut interface, "network", "interface", &name)?;

            push_at(
                &mut template,
                &["spec", "domain", "devices", "interfaces"],
                Value::Object(interface),
            );
            push_at(&mut template, &["spec", "networks"], with_name(network, name));
        }

        // Appended after the disks so it survives alongside them
        if let Some(user_data) = &self.cloud_init_nocloud {
            push_at(
                &mut template,
                &["spec", "volumes"],
                json!({"name": cloud_init::VOLUME_NAME, "cloudInitNoCloud": user_data}),
            );
            push_at(
                &mut template,
                &["spec", "domain", "devices", "disks"],
                json!({
                    "name": cloud_init::DISK_NAME,
                    "volumeName": cloud_init::VOLUME_NAME,
                    "disk": {"bus": "virtio"}
                }),
            );
        }

        Ok(template)
    }
}

fn named_entry(entry: &Value, what: &str) -> Result<(String, Map<String, Value>)> {
    let map = entry
        .as_object()
        .ok_or_else(|| VirtError::Validation(format!("each {} must be a mapping", what)))?;
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| VirtError::Validation(format!("each {} requires a name", what)))?;
    Ok((name.to_string(), map.clone()))
}

fn take_mapping(
    entry: &mut Map<String, Value>,
    key: &str,
    what: &str,
    name: &str,
) -> Result<Map<String, Value>> {
    match entry.remove(key) {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(VirtError::Validation(format!(
            "{} '{}' requires a '{}' mapping",
            what, name, key
        ))),
    }
}

fn with_name(mut map: Map<String, Value>, name: String) -> Value {
    map.insert("name".to_string(), Value::String(name));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: Value) -> TemplateParams {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_flat_parameters() {
        let template = params(json!({
            "memory": "64M",
            "machine_type": "q35",
            "labels": {"kubevirt.io/vm": "myvm"}
        }))
        .build()
        .unwrap();

        assert_eq!(
            template,
            json!({
                "metadata": {"labels": {"kubevirt.io/vm": "myvm"}},
                "spec": {"domain": {
                    "resources": {"requests": {"memory": "64M"}},
                    "machine": {"type": "q35"}
                }}
            })
        );
    }

    #[test]
    fn test_build_splits_disks_and_volumes() {
        let template = params(json!({
            "disks": [{
                "name": "containerdisk",
                "disk": {"bus": "virtio"},
                "volume": {"containerDisk": {"image": "kubevirt/cirros-container-disk-demo:latest"}}
            }]
        }))
        .build()
        .unwrap();

        assert_eq!(
            template["spec"]["domain"]["devices"]["disks"],
            json!([{"name": "containerdisk", "disk": {"bus": "virtio"}, "volumeName": "containerdiskvolume"}])
        );
        assert_eq!(
            template["spec"]["volumes"],
            json!([{
                "name": "containerdiskvolume",
                "containerDisk": {"image": "kubevirt/cirros-container-disk-demo:latest"}
            }])
        );
    }

    #[test]
    fn test_build_splits_interfaces_and_networks() {
        let template = params(json!({
            "interfaces": [{"name": "default", "bridge": {}, "network": {"pod": {}}}]
        }))
        .build()
        .unwrap();

        assert_eq!(
            template["spec"]["domain"]["devices"]["interfaces"],
            json!([{"name": "default", "bridge": {}}])
        );
        assert_eq!(template["spec"]["networks"], json!([{"name": "default", "pod": {}}]));
    }

    #[test]
    fn test_cloud_init_is_appended_after_disks() {
        let template = params(json!({
            "disks": [{"name": "rootdisk", "volume": {"containerDisk": {"image": "fedora"}}}],
            "cloud_init_nocloud": {"userData": "#cloud-config\npassword: fedora"}
        }))
        .build()
        .unwrap();

        let disks = template["spec"]["domain"]["devices"]["disks"].as_array().unwrap();
        let volumes = template["spec"]["volumes"].as_array().unwrap();
        assert_eq!(disks.len(), 2);
        assert_eq!(volumes.len(), 2);
        assert_eq!(disks[0]["name"], "rootdisk");
        assert_eq!(disks[1]["name"], cloud_init::DISK_NAME);
        assert_eq!(disks[1]["disk"]["bus"], "virtio");
        assert_eq!(volumes[1]["name"], cloud_init::VOLUME_NAME);
        assert_eq!(volumes[1]["cloudInitNoCloud"]["userData"], "#cloud-config\npassword: fedora");
    }

    #[test]
    fn test_disk_without_name_is_rejected() {
        let err = params(json!({"disks": [{"volume": {"emptyDisk": {}}}]}))
            .build()
            .unwrap_err();
        assert!(matches!(err, VirtError::Validation(_)));
    }

    #[test]
    fn test_interface_without_network_is_rejected() {
        let err = params(json!({"interfaces": [{"name": "default", "bridge": {}}]}))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("network"));
    }

    #[test]
    fn test_empty_parameters_build_empty_template() {
        assert_eq!(TemplateParams::default().build().unwrap(), json!({}));
    }
}
