// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `replica-set`: VirtualMachineInstanceReplicaSets.

use super::decision::Presence;
use super::presence::{ensure_presence, Outcome, ResourceParams};
use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::constants::wait::VM_TIMEOUT_SECS;
use crate::definition::{merge_values, set_path, TemplateParams};
use crate::error::{Result, VirtError};
use crate::kubernetes::conditions::replicas_ready;
use crate::kubernetes::{await_object, ResourceAccessor};
use crate::types::{ModuleOutput, VirtualMachineInstanceReplicaSet};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct ReplicaSetParams {
    #[serde(default)]
    state: Presence,
    #[serde(flatten)]
    resource: ResourceParams,
    #[serde(flatten)]
    template: TemplateParams,
    replicas: i32,
    selector: Option<Value>,
    #[serde(default = "default_wait")]
    wait: bool,
    #[serde(default = "default_wait_timeout")]
    wait_timeout: u64,
}

fn default_wait() -> bool {
    true
}

fn default_wait_timeout() -> u64 {
    VM_TIMEOUT_SECS
}

impl ReplicaSetParams {
    fn build(&self) -> Result<Value> {
        if self.replicas < 0 {
            return Err(VirtError::Validation("replicas must not be negative".to_string()));
        }

        let mut rs = json!({"spec": {"replicas": self.replicas}});
        if let Some(selector) = &self.selector {
            set_path(&mut rs, &["spec", "selector"], selector.clone());
        }
        let template = self.template.build()?;
        if template != json!({}) {
            set_path(&mut rs, &["spec", "template"], template);
        }
        Ok(rs)
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: ReplicaSetParams = args.parse()?;
    let definition = params.resource.definition()?;
    let (name, namespace) = params.resource.identity(&definition)?;
    let body = merge_values(definition, params.build()?);

    let accessor =
        ResourceAccessor::<VirtualMachineInstanceReplicaSet>::new(ctx.client.clone(), &namespace);
    let mut outcome = ensure_presence(
        &accessor,
        &name,
        &body,
        params.state,
        params.resource.force,
        ctx.check_mode,
    )
    .await?;

    let should_wait = params.wait
        && !ctx.check_mode
        && params.state == Presence::Present
        && outcome.changed();
    if should_wait {
        info!("Waiting for {} ready replicas of {}", params.replicas, name);
        let ready = await_object(
            accessor.api(),
            &name,
            params.wait_timeout,
            replicas_ready(params.replicas),
        )
        .await?;
        outcome = Outcome {
            action: outcome.action,
            object: Some(ready),
        };
    }

    let result = outcome.result()?;
    Ok(ModuleOutput::new(outcome.changed(), result.clone()).with("kubevirt_rs", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{not_found_json, object_value, watch_event, MockService, WATCH};

    const RS_PATH: &str = "/apis/kubevirt.io/v1/namespaces/vms/virtualmachineinstancereplicasets";

    fn args(value: Value) -> ModuleArgs {
        ModuleArgs::from_value(value).unwrap()
    }

    fn rs(version: &str, ready: Option<i32>) -> Value {
        object_value(
            "kubevirt.io/v1",
            "VirtualMachineInstanceReplicaSet",
            "vms",
            "baldr",
            version,
            json!({"replicas": 2}),
            ready.map(|r| json!({"readyReplicas": r})),
        )
    }

    #[test]
    fn test_build_includes_template_and_selector() {
        let params: ReplicaSetParams = args(json!({
            "name": "baldr",
            "namespace": "vms",
            "replicas": 2,
            "selector": {"matchLabels": {"myvmi": "myvmi"}},
            "memory": "64M",
            "labels": {"myvmi": "myvmi"}
        }))
        .parse()
        .unwrap();

        assert_eq!(
            params.build().unwrap(),
            json!({"spec": {
                "replicas": 2,
                "selector": {"matchLabels": {"myvmi": "myvmi"}},
                "template": {
                    "metadata": {"labels": {"myvmi": "myvmi"}},
                    "spec": {"domain": {"resources": {"requests": {"memory": "64M"}}}}
                }
            }})
        );
    }

    #[test]
    fn test_replicas_is_required() {
        assert!(args(json!({"name": "baldr", "namespace": "vms"}))
            .parse::<ReplicaSetParams>()
            .is_err());
    }

    #[tokio::test]
    async fn test_create_waits_for_replicas() {
        let item = format!("{}/baldr", RS_PATH);
        let mock = MockService::new()
            .on_get(&item, 404, &not_found_json("virtualmachineinstancereplicasets", "baldr"))
            .on_get(&item, 200, &rs("1", None).to_string())
            .on_post(RS_PATH, 201, &rs("1", None).to_string())
            .on_watch(
                RS_PATH,
                &[
                    watch_event("MODIFIED", rs("2", Some(1))),
                    watch_event("MODIFIED", rs("3", Some(2))),
                ],
            );
        let ctx = ModuleContext {
            client: mock.clone().into_client(),
            check_mode: false,
        };

        let output = run(
            &ctx,
            &args(json!({"name": "baldr", "namespace": "vms", "replicas": 2, "memory": "64M"})),
        )
        .await
        .unwrap();

        assert!(output.changed);
        assert_eq!(output.result["metadata"]["resourceVersion"], "3");
        assert_eq!(output.extra["kubevirt_rs"], output.result);
        assert_eq!(mock.requests_for(WATCH).len(), 1);
        let body = mock.requests_for("POST")[0].body.clone().unwrap();
        assert_eq!(body["spec"]["replicas"], 2);
    }

    #[tokio::test]
    async fn test_absent_does_not_wait() {
        let mock = MockService::new();
        let ctx = ModuleContext {
            client: mock.clone().into_client(),
            check_mode: false,
        };

        let output = run(
            &ctx,
            &args(json!({"state": "absent", "name": "baldr", "namespace": "vms", "replicas": 2})),
        )
        .await
        .unwrap();

        assert!(!output.changed);
        assert!(mock.requests_for(WATCH).is_empty());
    }
}
