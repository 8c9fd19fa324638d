// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `cdi-upload`: stream a local image into a claim through the CDI upload proxy.

use super::ModuleContext;
use crate::config::ModuleArgs;
use crate::constants::cdi;
use crate::error::{Result, VirtError};
use crate::kubernetes::ResourceAccessor;
use crate::types::{ModuleOutput, UploadTokenRequest};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Debug, Deserialize)]
struct UploadParams {
    pvc_name: String,
    pvc_namespace: String,
    upload_host: String,
    #[serde(default = "default_verify_ssl")]
    upload_host_verify_ssl: bool,
    path: PathBuf,
}

fn default_verify_ssl() -> bool {
    true
}

impl UploadParams {
    fn upload_url(&self) -> Result<Url> {
        let url = format!(
            "{}/{}/upload",
            self.upload_host.trim_end_matches('/'),
            cdi::UPLOAD_API_VERSION
        );
        Url::parse(&url).map_err(|e| {
            VirtError::Validation(format!("invalid upload_host {}: {}", self.upload_host, e))
        })
    }
}

/// The image to send, opened before anything is requested from the cluster
struct Image {
    file: File,
    length: u64,
    file_name: String,
}

impl Image {
    async fn open(path: &Path) -> Result<Self> {
        let unreadable =
            |e: std::io::Error| VirtError::Validation(format!("cannot read {}: {}", path.display(), e));
        let file = File::open(path).await.map_err(unreadable)?;
        let length = file.metadata().await.map_err(unreadable)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self {
            file,
            length,
            file_name,
        })
    }
}

#[instrument(skip_all)]
pub async fn run(ctx: &ModuleContext, args: &ModuleArgs) -> Result<ModuleOutput> {
    let params: UploadParams = args.parse()?;
    let url = params.upload_url()?;
    let image = Image::open(&params.path).await?;

    if ctx.check_mode {
        info!(
            "Check mode: skipping upload of {} into {}/{}",
            params.path.display(),
            params.pvc_namespace,
            params.pvc_name
        );
        return Ok(ModuleOutput::new(true, json!({})));
    }

    let token = request_token(ctx, &params.pvc_namespace, &params.pvc_name).await?;
    let http = http_client(params.upload_host_verify_ssl)?;
    upload_image(&http, url, &token, image).await?;

    Ok(ModuleOutput::new(true, json!({})))
}

/// Create an `UploadTokenRequest` for the claim and return the issued token
pub async fn request_token(ctx: &ModuleContext, namespace: &str, pvc_name: &str) -> Result<String> {
    let requests = ResourceAccessor::<UploadTokenRequest>::new(ctx.client.clone(), namespace);
    let issued = requests
        .create(pvc_name, &json!({"spec": {"pvcName": pvc_name}}))
        .await?;

    issued
        .token()
        .map(str::to_string)
        .ok_or_else(|| VirtError::Upload {
            status: None,
            message: format!("no upload token was issued for {}/{}", namespace, pvc_name),
        })
}

fn http_client(verify_ssl: bool) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .danger_accept_invalid_certs(!verify_ssl)
        .build()?)
}

async fn upload_image(http: &reqwest::Client, url: Url, token: &str, image: Image) -> Result<()> {
    info!("Uploading {} ({} bytes) to {}", image.file_name, image.length, url);
    let part = Part::stream_with_length(image.file, image.length).file_name(image.file_name);
    let form = Form::new().part(cdi::UPLOAD_FORM_FIELD, part);

    let response = http
        .post(url)
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await?
        .error_for_status()?;
    debug!("Upload proxy answered {}", response.status());
    Ok(())
}
