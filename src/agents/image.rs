//! Image resolution for vision requests
//!
//! A turn carries at most one image. Sources are tried in order and the
//! first one that yields bytes wins:
//! 1. a URL or absolute `.jpg`/`.jpeg`/`.png` path written in the text
//! 2. a camera entity whose id or name appears in the text
//!
//! Every failure along the way is logged and treated as "no image".

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::agents::config::LlmProviderConfig;
use crate::agents::domain::ImageSource;
use crate::agents::error::ImageError;
use crate::devices::{entity_domain, DeviceRegistry, EntityState};

static IMAGE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(https?://\S+|/\S+\.(?:jpg|jpeg|png))").expect("image reference pattern")
});

const TRAILING_PUNCTUATION: &[char] = &[',', ';', '!', '?', ')', '"', '\''];

/// An image picked for this turn
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub source: ImageSource,
    pub bytes: Vec<u8>,
}

/// Find the first URL or local image path written in `text`
pub fn find_image_reference(text: &str) -> ImageSource {
    let Some(found) = IMAGE_REFERENCE.find(text) else {
        return ImageSource::None;
    };

    let reference = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
    if reference.to_ascii_lowercase().starts_with("http") {
        ImageSource::Url(reference.to_string())
    } else {
        ImageSource::LocalPath(reference.to_string())
    }
}

/// Whether the (already lowercased) text names this camera
fn camera_mentioned(text_lower: &str, camera: &EntityState) -> bool {
    if text_lower.contains(&camera.entity_id.to_lowercase()) {
        return true;
    }
    let name = camera.name.trim();
    !name.is_empty() && text_lower.contains(&name.to_lowercase())
}

/// Picks and loads the image that accompanies a turn
pub struct ImageResolver {
    client: reqwest::Client,
    max_bytes: u64,
}

impl ImageResolver {
    pub fn new(config: &LlmProviderConfig) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.image_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_image_bytes,
        })
    }

    /// Resolve the image for `text`, if any
    pub async fn resolve(
        &self,
        text: &str,
        registry: &dyn DeviceRegistry,
        selected_entities: &[String],
    ) -> Option<ResolvedImage> {
        let reference = find_image_reference(text);
        let loaded = match &reference {
            ImageSource::Url(url) => Some(self.fetch_url(url).await),
            ImageSource::LocalPath(path) => Some(read_local(path).await),
            _ => None,
        };

        match loaded {
            Some(Ok(bytes)) => {
                info!("Attached image from {:?} ({} bytes)", reference, bytes.len());
                return Some(ResolvedImage {
                    source: reference,
                    bytes,
                });
            }
            Some(Err(e)) => warn!("Ignoring image reference {:?}: {}", reference, e),
            None => {}
        }

        self.capture_named_camera(text, registry, selected_entities)
            .await
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ImageError::Status(status.as_u16()));
        }
        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(ImageError::TooLarge(self.max_bytes));
            }
        }

        // Content-Length can be missing or understated
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(ImageError::TooLarge(self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(ImageError::Fetch("empty body".to_string()));
        }
        Ok(bytes)
    }

    async fn capture_named_camera(
        &self,
        text: &str,
        registry: &dyn DeviceRegistry,
        selected_entities: &[String],
    ) -> Option<ResolvedImage> {
        let selected_cameras: Vec<&String> = selected_entities
            .iter()
            .filter(|id| entity_domain(id) == "camera")
            .collect();

        let cameras = if selected_cameras.is_empty() {
            match registry.states_in_domain("camera").await {
                Ok(cameras) => cameras,
                Err(e) => {
                    warn!("Failed to list cameras: {}", e);
                    return None;
                }
            }
        } else {
            let mut cameras = Vec::with_capacity(selected_cameras.len());
            for camera_id in selected_cameras {
                match registry.get_state(camera_id).await {
                    Ok(Some(camera)) => cameras.push(camera),
                    Ok(None) => debug!("Camera {} not in registry, skipping", camera_id),
                    Err(e) => warn!("Failed to read camera {}: {}", camera_id, e),
                }
            }
            cameras
        };

        let text_lower = text.to_lowercase();
        for camera in cameras {
            if !camera_mentioned(&text_lower, &camera) {
                continue;
            }

            match registry.camera_image(&camera.entity_id).await {
                Ok(bytes) if !bytes.is_empty() => {
                    info!(
                        "Attached snapshot from {} ({} bytes)",
                        camera.entity_id,
                        bytes.len()
                    );
                    return Some(ResolvedImage {
                        source: ImageSource::Device(camera.entity_id),
                        bytes,
                    });
                }
                Ok(_) => warn!("Camera {} returned an empty image", camera.entity_id),
                Err(e) => warn!("{}", ImageError::Capture(e)),
            }
        }

        None
    }
}

async fn read_local(path: &str) -> Result<Vec<u8>, ImageError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ImageError::NotFound(path.to_string()));
    }
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(ImageError::Fetch(format!("{} is empty", path)));
    }
    Ok(bytes)
}
