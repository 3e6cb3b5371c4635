use crate::error::{MammoprepError, Result};
use crate::extraction::{find_image_file, load_dicom_image, mask_candidates, MaskResolver};
use crate::pipeline::summary::SkipReason;
use crate::processing::{
    crop_to_bbox, extract_patch, random_crops, resize_square, sub_crop_size, synthetize,
};
use crate::types::{CaseRecord, PrepConfig};
use image::{DynamicImage, GrayImage, ImageBuffer, Pixel};
use log::{debug, warn};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of processing one table row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Files written for the row
    Written(Vec<PathBuf>),
    /// Nothing was written
    Skipped { reason: SkipReason, message: String },
}

impl RowOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, RowOutcome::Written(_))
    }
}

/// An output image and its file name
type Rendered = (String, DynamicImage);

/// Turns one case record into output images
///
/// Rows are independent: a processor holds no mutable state and can be
/// shared across worker threads.
pub struct RowProcessor<'a, R> {
    config: &'a PrepConfig,
    resolver: R,
}

impl<'a, R: MaskResolver> RowProcessor<'a, R> {
    pub fn new(config: &'a PrepConfig, resolver: R) -> Self {
        Self { config, resolver }
    }

    /// Processes a row and writes its images into `class_dir`
    ///
    /// Files are written only once every image of the row has been produced;
    /// if a write fails, the files already written for the row are removed.
    pub fn process<G: Rng + ?Sized>(
        &self,
        record: &CaseRecord,
        class_dir: &Path,
        rng: &mut G,
    ) -> RowOutcome {
        match self
            .render(record, rng)
            .and_then(|images| write_outputs(class_dir, images))
        {
            Ok(paths) => RowOutcome::Written(paths),
            Err(e) => RowOutcome::Skipped {
                reason: SkipReason::from_error(&e),
                message: e.to_string(),
            },
        }
    }

    /// Produces the output images of a row without writing them
    pub fn render<G: Rng + ?Sized>(&self, record: &CaseRecord, rng: &mut G) -> Result<Vec<Rendered>> {
        let image_path = find_image_file(&record.image_dir(&self.config.data_dir))?;
        let image = load_dicom_image(&image_path)?;
        debug!(
            "Row {}: loaded {} ({}x{})",
            record.row_id,
            image_path.display(),
            image.width(),
            image.height()
        );

        if self.config.task.is_roi() {
            self.render_lesion(record, &image, rng)
        } else {
            self.render_scan(record, &image)
        }
    }

    /// Whole mammogram, resized
    fn render_scan(&self, record: &CaseRecord, image: &GrayImage) -> Result<Vec<Rendered>> {
        let size = self.config.img_size;
        let output = if self.config.synthetized {
            let (rgb, _) = synthetize(image)?;
            DynamicImage::ImageRgb8(resize_square(&rgb, size))
        } else {
            DynamicImage::ImageLuma8(resize_square(image, size))
        };
        Ok(vec![(format!("{}.png", record.row_id), output)])
    }

    /// Random sub-crops of the padded lesion patch, resized
    fn render_lesion<G: Rng + ?Sized>(
        &self,
        record: &CaseRecord,
        image: &GrayImage,
        rng: &mut G,
    ) -> Result<Vec<Rendered>> {
        let candidates = mask_candidates(&record.mask_dirs(&self.config.data_dir))?;
        let mask = self
            .resolver
            .resolve(&candidates, image.dimensions())?
            .ok_or_else(|| {
                MammoprepError::AmbiguousMask(format!(
                    "none of {} candidate(s) matches a {}x{} image",
                    candidates.len(),
                    image.width(),
                    image.height()
                ))
            })?;
        if mask.dimensions() != image.dimensions() {
            warn!(
                "Row {}: mask is {:?}, image is {:?}",
                record.row_id,
                mask.dimensions(),
                image.dimensions()
            );
        }

        let crops: Vec<DynamicImage> = if self.config.synthetized {
            let (rgb, breast) = synthetize(image)?;
            let mask = crop_to_bbox(&mask, breast.bbox);
            self.lesion_crops(&rgb, &mask, rng)?
                .into_iter()
                .map(DynamicImage::ImageRgb8)
                .collect()
        } else {
            self.lesion_crops(image, &mask, rng)?
                .into_iter()
                .map(DynamicImage::ImageLuma8)
                .collect()
        };

        if self.config.random_patches == 0 {
            return Ok(crops
                .into_iter()
                .map(|crop| (format!("{}.png", record.row_id), crop))
                .collect());
        }
        Ok(crops
            .into_iter()
            .enumerate()
            .map(|(idx, crop)| (format!("{}_{}.png", record.row_id, idx), crop))
            .collect())
    }

    /// Extracts the lesion patch and its resized sub-crops
    ///
    /// With no random patches requested the whole patch is returned.
    fn lesion_crops<P, G>(
        &self,
        image: &ImageBuffer<P, Vec<P::Subpixel>>,
        mask: &GrayImage,
        rng: &mut G,
    ) -> Result<Vec<ImageBuffer<P, Vec<P::Subpixel>>>>
    where
        P: Pixel + 'static,
        P::Subpixel: 'static,
        G: Rng + ?Sized,
    {
        let size = self.config.img_size;
        let (patch, bbox) = extract_patch(image, mask, self.config.padding)?;
        debug!("Lesion patch {} ({} px)", bbox, bbox.area());

        if self.config.random_patches == 0 {
            return Ok(vec![resize_square(&patch, size)]);
        }

        let side = sub_crop_size(patch.dimensions(), self.config.crop_margin)?;
        let crops = random_crops(&patch, side, self.config.random_patches, rng)?;
        Ok(crops.iter().map(|crop| resize_square(crop, size)).collect())
    }
}

/// Writes rendered images as PNG files under `dir`
///
/// On failure every file written by this call is removed again.
fn write_outputs(dir: &Path, images: Vec<Rendered>) -> Result<Vec<PathBuf>> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(images.len());
    for (name, image) in images {
        let path = dir.join(name);
        if let Err(e) = image.save(&path) {
            for file in &written {
                let _ = fs::remove_file(file);
            }
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
        written.push(path);
    }
    Ok(written)
}
