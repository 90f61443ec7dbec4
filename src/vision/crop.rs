//! Local crop collaborator — extracts bounding-box regions for refinement.
//!
//! Crops are written as PNG into a temp directory owned by the cropper, so
//! they live exactly as long as the cropper and never litter the source
//! directory. Requested regions are clamped to the image bounds; a region
//! entirely outside the image is an error the orchestrator absorbs.

use std::path::Path;

use uuid::Uuid;

use super::VisionError;
use crate::pipeline::refine::ImageCropper;
use crate::pipeline::signal::BoundingBox;

/// Cropper backed by the `image` crate and a private temp directory.
pub struct LocalImageCropper {
    dir: tempfile::TempDir,
}

impl LocalImageCropper {
    pub fn new() -> Result<Self, VisionError> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }
}

impl ImageCropper for LocalImageCropper {
    fn crop(&self, uri: &str, region: &BoundingBox) -> Result<String, VisionError> {
        let img = image::open(Path::new(uri)).map_err(|e| VisionError::Image(e.to_string()))?;

        let (width, height) = (img.width(), img.height());
        if region.x >= width || region.y >= height {
            return Err(VisionError::InvalidRegion(*region));
        }
        let w = region.w.min(width - region.x);
        let h = region.h.min(height - region.y);
        if w == 0 || h == 0 {
            return Err(VisionError::InvalidRegion(*region));
        }

        let cropped = img.crop_imm(region.x, region.y, w, h);
        let path = self.dir.path().join(format!("crop-{}.png", Uuid::new_v4()));
        cropped
            .save(&path)
            .map_err(|e| VisionError::Image(e.to_string()))?;

        tracing::debug!(
            source = %uri,
            ?region,
            crop = %path.display(),
            "Extracted crop region"
        );
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Write a solid test image and return its path inside the given dir.
    fn test_image(dir: &Path, width: u32, height: u32) -> String {
        let img = RgbImage::from_pixel(width, height, Rgb([120, 80, 40]));
        let path = dir.join("scene.png");
        img.save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn crops_interior_region() {
        let scene_dir = tempfile::tempdir().unwrap();
        let source = test_image(scene_dir.path(), 100, 100);
        let cropper = LocalImageCropper::new().unwrap();

        let crop_uri = cropper
            .crop(&source, &BoundingBox::new(10, 10, 40, 30))
            .unwrap();
        let cropped = image::open(&crop_uri).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (40, 30));
    }

    #[test]
    fn region_is_clamped_to_image_bounds() {
        let scene_dir = tempfile::tempdir().unwrap();
        let source = test_image(scene_dir.path(), 50, 50);
        let cropper = LocalImageCropper::new().unwrap();

        let crop_uri = cropper
            .crop(&source, &BoundingBox::new(40, 40, 100, 100))
            .unwrap();
        let cropped = image::open(&crop_uri).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (10, 10));
    }

    #[test]
    fn region_outside_image_is_rejected() {
        let scene_dir = tempfile::tempdir().unwrap();
        let source = test_image(scene_dir.path(), 50, 50);
        let cropper = LocalImageCropper::new().unwrap();

        let result = cropper.crop(&source, &BoundingBox::new(60, 60, 10, 10));
        assert!(matches!(result, Err(VisionError::InvalidRegion(_))));
    }

    #[test]
    fn zero_area_region_is_rejected() {
        let scene_dir = tempfile::tempdir().unwrap();
        let source = test_image(scene_dir.path(), 50, 50);
        let cropper = LocalImageCropper::new().unwrap();

        let result = cropper.crop(&source, &BoundingBox::new(10, 10, 0, 10));
        assert!(matches!(result, Err(VisionError::InvalidRegion(_))));
    }

    #[test]
    fn missing_source_image_is_an_image_error() {
        let cropper = LocalImageCropper::new().unwrap();
        let result = cropper.crop("/nonexistent/scene.png", &BoundingBox::new(0, 0, 10, 10));
        assert!(matches!(result, Err(VisionError::Image(_))));
    }

    #[test]
    fn crops_land_in_the_private_temp_dir() {
        let scene_dir = tempfile::tempdir().unwrap();
        let source = test_image(scene_dir.path(), 50, 50);
        let cropper = LocalImageCropper::new().unwrap();

        let crop_uri = cropper
            .crop(&source, &BoundingBox::new(0, 0, 10, 10))
            .unwrap();
        assert!(Path::new(&crop_uri).starts_with(cropper.dir.path()));
    }
}
