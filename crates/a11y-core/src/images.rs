//! Image alt-text accounting

use serde::{Deserialize, Serialize};

use crate::snapshot::ImageElement;

/// Roles that mark an image as decorative
pub const DECORATIVE_ROLES: [&str; 2] = ["presentation", "none"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAccessibilityResult {
    total_images: usize,
    images_without_alt: usize,
    percentage_without_alt: f64,
    /// `src` of every image counted as missing alt text
    #[serde(default)]
    offenders: Vec<String>,
}

impl ImageAccessibilityResult {
    pub fn total_images(&self) -> usize {
        self.total_images
    }

    pub fn images_without_alt(&self) -> usize {
        self.images_without_alt
    }

    pub fn percentage_without_alt(&self) -> f64 {
        self.percentage_without_alt
    }

    pub fn offenders(&self) -> &[String] {
        &self.offenders
    }
}

/// Whether the image carries a decorative role (`presentation` / `none`)
pub fn is_decorative(image: &ImageElement) -> bool {
    image
        .role
        .as_deref()
        .map(|role| {
            let role = role.trim().to_ascii_lowercase();
            DECORATIVE_ROLES.contains(&role.as_str())
        })
        .unwrap_or(false)
}

/// An image lacks alt text when `alt` is absent or blank and it is not decorative
pub fn is_missing_alt(image: &ImageElement) -> bool {
    let blank_alt = image
        .alt
        .as_deref()
        .map(|alt| alt.trim().is_empty())
        .unwrap_or(true);
    blank_alt && !is_decorative(image)
}

pub fn check_image_accessibility(images: &[ImageElement]) -> ImageAccessibilityResult {
    let offenders: Vec<String> = images
        .iter()
        .filter(|img| is_missing_alt(img))
        .map(|img| img.src.clone().unwrap_or_else(|| "<no src>".to_string()))
        .collect();

    let total_images = images.len();
    let images_without_alt = offenders.len();
    let percentage_without_alt = if total_images == 0 {
        0.0
    } else {
        images_without_alt as f64 / total_images as f64 * 100.0
    };

    ImageAccessibilityResult {
        total_images,
        images_without_alt,
        percentage_without_alt,
        offenders,
    }
}
