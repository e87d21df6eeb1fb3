//! Image storage service integration
//!
//! [`ImageService`] is the whole capability set of the remote image store.
//! [`ImageClient`] talks to a real service over HTTP; [`MockImageClient`]
//! keeps images in memory for tests and dry runs.

pub mod client;
pub mod mock;

pub use client::ImageClient;
pub use mock::MockImageClient;

use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// Largest payload accepted for upload (10 MiB).
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Header carrying the auth token on upload and delete.
pub const TOKEN_HEADER: &str = "token";

/// Body of a downloaded image, chunk by chunk.
pub type ImageStream = BoxStream<'static, Result<Bytes>>;

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Upload an image with no minimum size constraint.
    async fn upload_image(&self, image: &[u8], name: &str) -> Result<String> {
        self.upload_image_with_min_size(image, name, 0, 0).await
    }

    /// Upload an image and return the id the service assigned. A zero
    /// minimum means "no constraint".
    async fn upload_image_with_min_size(
        &self,
        image: &[u8],
        name: &str,
        min_width: u32,
        min_height: u32,
    ) -> Result<String>;

    async fn get_image(
        &self,
        image_id: &str,
        image_type: &str,
        scale: Option<&str>,
    ) -> Result<Vec<u8>>;

    async fn get_image_stream(
        &self,
        image_id: &str,
        image_type: &str,
        scale: Option<&str>,
    ) -> Result<ImageStream>;

    async fn delete_image(&self, image_id: &str) -> Result<bool>;

    /// Public URL of an image.
    fn image_url(&self, image_id: &str, image_type: &str) -> String;

    /// Public URL of a resized variant of an image.
    fn scaled_image_url(&self, image_id: &str, image_type: &str, scale: &str) -> String;

    fn upload_url(&self) -> String;

    fn intranet_addr(&self) -> &str;

    fn internet_addr(&self) -> &str;
}

/// Reject uploads that must never reach the network.
pub(crate) fn check_upload(image: &[u8], name: &str) -> Result<()> {
    if image.is_empty() {
        tracing::error!("No image content to upload for {}", name);
        return Err(Error::Unavailable(format!("no image content for {}", name)));
    }

    if image.len() > MAX_IMAGE_SIZE {
        tracing::error!(
            "Upload image size {} greater than 10M limit for {}",
            image.len(),
            name
        );
        return Err(Error::Unavailable(format!(
            "image {} is {} bytes, limit is {}",
            name,
            image.len(),
            MAX_IMAGE_SIZE
        )));
    }

    Ok(())
}
