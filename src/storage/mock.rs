use super::{check_upload, ImageService, ImageStream};
use crate::models::UploadResponse;
use crate::urls;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory image store. Uploads are kept by id unless a scripted server
/// response is queued, in which case that body is interpreted instead.
#[derive(Clone)]
pub struct MockImageClient {
    images: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    upload_responses: Arc<Mutex<Vec<String>>>,
    intranet_url: String,
    internet_url: String,
    upload_count: Arc<Mutex<usize>>,
    download_count: Arc<Mutex<usize>>,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self {
            images: Arc::new(Mutex::new(HashMap::new())),
            upload_responses: Arc::new(Mutex::new(Vec::new())),
            intranet_url: "http://mock-idps.internal".to_string(),
            internet_url: "https://mock-idps.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            download_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_urls(mut self, intranet_url: String, internet_url: String) -> Self {
        self.intranet_url = intranet_url;
        self.internet_url = internet_url;
        self
    }

    pub fn with_image(self, image_id: String, content: Vec<u8>) -> Self {
        self.images.lock().unwrap().insert(image_id, content);
        self
    }

    /// Queue a raw server body for the next upload.
    pub fn with_upload_response(self, body: String) -> Self {
        self.upload_responses.lock().unwrap().push(body);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_download_count(&self) -> usize {
        *self.download_count.lock().unwrap()
    }

    pub fn get_images(&self) -> HashMap<String, Vec<u8>> {
        self.images.lock().unwrap().clone()
    }

    fn lookup(&self, image_id: &str) -> Result<Vec<u8>> {
        *self.download_count.lock().unwrap() += 1;

        self.images
            .lock()
            .unwrap()
            .get(image_id)
            .cloned()
            .ok_or_else(|| Error::Unavailable(format!("Image not found: {}", image_id)))
    }
}

impl Default for MockImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageClient {
    async fn upload_image_with_min_size(
        &self,
        image: &[u8],
        name: &str,
        _min_width: u32,
        _min_height: u32,
    ) -> Result<String> {
        check_upload(image, name)?;
        *self.upload_count.lock().unwrap() += 1;

        let scripted = {
            let mut responses = self.upload_responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        };

        let id = match scripted {
            Some(body) => UploadResponse::interpret(&body)?,
            None => Uuid::new_v4().simple().to_string(),
        };

        self.images
            .lock()
            .unwrap()
            .insert(id.clone(), image.to_vec());
        Ok(id)
    }

    async fn get_image(
        &self,
        image_id: &str,
        _image_type: &str,
        _scale: Option<&str>,
    ) -> Result<Vec<u8>> {
        self.lookup(image_id)
    }

    async fn get_image_stream(
        &self,
        image_id: &str,
        _image_type: &str,
        _scale: Option<&str>,
    ) -> Result<ImageStream> {
        let content = Bytes::from(self.lookup(image_id)?);
        Ok(stream::once(async move { Ok::<_, Error>(content) }).boxed())
    }

    async fn delete_image(&self, image_id: &str) -> Result<bool> {
        Ok(self.images.lock().unwrap().remove(image_id).is_some())
    }

    fn image_url(&self, image_id: &str, image_type: &str) -> String {
        urls::image_path(&self.internet_url, image_id, image_type, None)
    }

    fn scaled_image_url(&self, image_id: &str, image_type: &str, scale: &str) -> String {
        urls::image_path(&self.internet_url, image_id, image_type, Some(scale))
    }

    fn upload_url(&self) -> String {
        urls::upload_url(&self.intranet_url)
    }

    fn intranet_addr(&self) -> &str {
        &self.intranet_url
    }

    fn internet_addr(&self) -> &str {
        &self.internet_url
    }
}
