// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Waiting for a single named object to reach a condition.

use crate::constants::wait::{MAX_WATCH_TIMEOUT_SECS, WATCH_RESTART_DELAY_SECS};
use crate::error::{Result, VirtError};
use futures::TryStreamExt;
use kube::api::{Api, WatchEvent, WatchParams};
use kube::ResourceExt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use super::accessor::ManagedResource;

/// What a condition concluded about one observed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Pending,
    /// Terminal; waiting any longer cannot succeed
    Failed(String),
}

/// Wait until `condition` reports the object named `name` ready.
///
/// The current object is checked first, then a watch filtered on the name is
/// followed from its `resourceVersion`. Server-side watch timeouts are capped, so
/// the watch is reopened from the last seen version until `timeout_secs` runs out,
/// which yields [`VirtError::Timeout`].
///
/// Conditions see `None` when the object was deleted while waiting; anything but
/// [`Readiness::Ready`] for it ends the wait with [`VirtError::TerminalFailure`].
#[instrument(skip(api, condition))]
pub async fn await_object<K, C>(
    api: &Api<K>,
    name: &str,
    timeout_secs: u64,
    condition: C,
) -> Result<K>
where
    K: ManagedResource,
    C: Fn(Option<&K>) -> Readiness,
{
    let budget = Duration::from_secs(timeout_secs);
    let deadline = Instant::now() + budget;

    match tokio::time::timeout(budget, watch_until(api, name, deadline, &condition)).await {
        Ok(result) => result,
        Err(_) => Err(VirtError::Timeout { secs: timeout_secs }),
    }
}

async fn watch_until<K, C>(api: &Api<K>, name: &str, deadline: Instant, condition: &C) -> Result<K>
where
    K: ManagedResource,
    C: Fn(Option<&K>) -> Readiness,
{
    let current = api
        .get_opt(name)
        .await
        .map_err(|e| VirtError::from_kube("get", e))?;

    let mut version = match current {
        Some(obj) => {
            if let Some(done) = conclude(obj.clone(), condition) {
                return done;
            }
            obj.resource_version().unwrap_or_else(|| "0".to_string())
        }
        None => "0".to_string(),
    };

    info!(
        "Waiting up to {}s for {}",
        deadline.saturating_duration_since(Instant::now()).as_secs(),
        name
    );
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now()).as_secs();
        let server_timeout = u32::try_from(remaining)
            .unwrap_or(MAX_WATCH_TIMEOUT_SECS)
            .clamp(1, MAX_WATCH_TIMEOUT_SECS);
        let params = WatchParams::default()
            .fields(&format!("metadata.name={}", name))
            .timeout(server_timeout);

        let stream = api
            .watch(&params, &version)
            .await
            .map_err(|e| VirtError::from_kube("watch", e))?;
        let mut stream = std::pin::pin!(stream);

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| VirtError::from_kube("watch", e))?
        {
            match event {
                WatchEvent::Added(obj) | WatchEvent::Modified(obj) => {
                    if obj.name_any() != name {
                        continue;
                    }
                    if let Some(seen) = obj.resource_version() {
                        version = seen;
                    }
                    if let Some(done) = conclude(obj, condition) {
                        return done;
                    }
                }
                WatchEvent::Deleted(obj) => {
                    if obj.name_any() != name {
                        continue;
                    }
                    return match condition(None) {
                        Readiness::Ready => Ok(obj),
                        Readiness::Failed(reason) => Err(VirtError::TerminalFailure(reason)),
                        Readiness::Pending => Err(VirtError::TerminalFailure(format!(
                            "{} {} was deleted while waiting",
                            K::kind(&()),
                            name
                        ))),
                    };
                }
                WatchEvent::Bookmark(bookmark) => version = bookmark.metadata.resource_version,
                WatchEvent::Error(err) => {
                    return Err(VirtError::Api {
                        action: "watch",
                        code: err.code,
                        reason: err.reason,
                        message: err.message,
                    })
                }
            }
        }

        debug!("Watch on {} ended, reopening from resourceVersion {}", name, version);
        tokio::time::sleep(Duration::from_secs(WATCH_RESTART_DELAY_SECS)).await;
    }
}

fn conclude<K, C>(obj: K, condition: &C) -> Option<Result<K>>
where
    C: Fn(Option<&K>) -> Readiness,
{
    match condition(Some(&obj)) {
        Readiness::Ready => Some(Ok(obj)),
        Readiness::Failed(reason) => Some(Err(VirtError::TerminalFailure(reason))),
        Readiness::Pending => None,
    }
}
