use super::{check_upload, ImageService, ImageStream, TOKEN_HEADER};
use crate::config::ClientConfig;
use crate::mime::detect_image_mime;
use crate::models::UploadResponse;
use crate::token::TokenBuilder;
use crate::urls;
use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{error, info, warn};

/// HTTP client for the image storage service.
#[derive(Debug)]
pub struct ImageClient {
    client: Client,
    config: ClientConfig,
    tokens: TokenBuilder,
}

impl ImageClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    /// Build on top of an existing connection pool. The pool's own timeout
    /// applies instead of the configured one.
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        let tokens = TokenBuilder::new(config.sec_key.as_deref());
        Self {
            client,
            config,
            tokens,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token for the configured identity, recomputed on every call.
    pub fn create_token(&self) -> Result<Option<String>> {
        self.tokens.build(
            &self.config.pid,
            &self.config.srv_id,
            &self.config.srv_pwd,
        )
    }

    fn intranet_base(&self) -> Result<&str> {
        if self.config.intranet_url.trim().is_empty() {
            error!("No image service url, please check the service configuration");
            return Err(Error::Unavailable(
                "image service url is not configured".to_string(),
            ));
        }
        Ok(&self.config.intranet_url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.create_token()? {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        })
    }

    async fn fetch(
        &self,
        image_id: &str,
        image_type: &str,
        scale: Option<&str>,
    ) -> Result<Response> {
        let url = urls::download_url(self.intranet_base()?, image_id, image_type, scale)?;
        info!("Start to download {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!("Failed to download {}: {}", url, e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Download of {} returned status {}", url, status);
            return Err(Error::Unavailable(format!(
                "{} returned status {}",
                url, status
            )));
        }

        info!("Successfully downloaded {}", url);
        Ok(response)
    }
}

#[async_trait]
impl ImageService for ImageClient {
    async fn upload_image_with_min_size(
        &self,
        image: &[u8],
        name: &str,
        min_width: u32,
        min_height: u32,
    ) -> Result<String> {
        check_upload(image, name)?;
        let url = urls::upload_url(self.intranet_base()?);

        let file = Part::bytes(image.to_vec())
            .file_name(name.to_string())
            .mime_str(detect_image_mime(image))?;
        let mut form = Form::new().part("file", file).text("name", name.to_string());
        if min_width > 0 {
            form = form.text("minWidth", min_width.to_string());
        }
        if min_height > 0 {
            form = form.text("minHeight", min_height.to_string());
        }

        info!("Uploading {} ({} bytes) to {}", name, image.len(), url);
        let response = self
            .authorize(self.client.post(&url).multipart(form))?
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload {}: {}", name, e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("Upload of {} returned status {}", name, status);
        }

        let id = UploadResponse::interpret(&body)?;
        info!("Uploaded {} as {}", name, id);
        Ok(id)
    }

    async fn get_image(
        &self,
        image_id: &str,
        image_type: &str,
        scale: Option<&str>,
    ) -> Result<Vec<u8>> {
        let response = self.fetch(image_id, image_type, scale).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_image_stream(
        &self,
        image_id: &str,
        image_type: &str,
        scale: Option<&str>,
    ) -> Result<ImageStream> {
        let response = self.fetch(image_id, image_type, scale).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from))
            .boxed())
    }

    async fn delete_image(&self, image_id: &str) -> Result<bool> {
        let url = urls::delete_url(self.intranet_base()?);
        info!("Deleting image {}", image_id);

        let response = self
            .authorize(self.client.get(&url).query(&[("imageId", image_id)]))?
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete {}: {}", image_id, e);
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Delete of {} returned status {}", image_id, status);
            return Ok(false);
        }

        let body = response.text().await?;
        let deleted = serde_json::from_str::<UploadResponse>(&body)
            .map(|envelope| envelope.is_success())
            .unwrap_or(false);
        if !deleted {
            warn!("Delete of {} was not confirmed: {}", image_id, body);
        }
        Ok(deleted)
    }

    fn image_url(&self, image_id: &str, image_type: &str) -> String {
        urls::image_path(&self.config.internet_url, image_id, image_type, None)
    }

    fn scaled_image_url(&self, image_id: &str, image_type: &str, scale: &str) -> String {
        urls::image_path(&self.config.internet_url, image_id, image_type, Some(scale))
    }

    fn upload_url(&self) -> String {
        urls::upload_url(&self.config.intranet_url)
    }

    fn intranet_addr(&self) -> &str {
        &self.config.intranet_url
    }

    fn internet_addr(&self) -> &str {
        &self.config.internet_url
    }
}
