//! Client for the IDPS image storage service
//!
//! Uploads, downloads and deletes images on a remote image server and builds
//! public URLs for them. Upload and delete are authenticated with a token
//! derived from the configured party and service identity.

pub mod config;
pub mod error;
pub mod mime;
pub mod models;
pub mod storage;
pub mod token;
pub mod urls;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use storage::{ImageClient, ImageService, ImageStream, MockImageClient};
