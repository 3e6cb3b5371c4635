use crate::error::Result;
use image::GrayImage;
use log::debug;
use std::path::{Path, PathBuf};

use super::loader::{find_dicom_files, load_dicom_image};

/// Picks the ROI mask of an abnormality among candidate files
///
/// A lesion's supplementary series holds the true mask and a cropped
/// reference patch with no reliable naming convention between them, so the
/// choice is isolated behind this trait.
pub trait MaskResolver {
    /// Returns the candidate pixel-aligned with a source image of
    /// `source_dims` (width, height), or `None` when no candidate qualifies.
    fn resolve(&self, candidates: &[PathBuf], source_dims: (u32, u32)) -> Result<Option<GrayImage>>;
}

/// Resolves masks by exact shape equality with the source image
///
/// - one candidate: returned unconditionally
/// - several candidates: the first, in order, whose dimensions equal the
///   source dimensions
/// - no candidate, or no match: `None`
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeMatchResolver;

impl MaskResolver for ShapeMatchResolver {
    fn resolve(&self, candidates: &[PathBuf], source_dims: (u32, u32)) -> Result<Option<GrayImage>> {
        select_aligned_mask(candidates, source_dims, |path| load_dicom_image(path))
    }
}

/// Shape-matching selection over candidates loaded with `load`
pub fn select_aligned_mask<P, F>(
    candidates: &[P],
    source_dims: (u32, u32),
    mut load: F,
) -> Result<Option<GrayImage>>
where
    F: FnMut(&P) -> Result<GrayImage>,
{
    match candidates {
        [] => Ok(None),
        [only] => load(only).map(Some),
        _ => {
            for (idx, candidate) in candidates.iter().enumerate() {
                let image = load(candidate)?;
                if image.dimensions() == source_dims {
                    debug!("Mask candidate {} matches {:?}", idx, source_dims);
                    return Ok(Some(image));
                }
                debug!(
                    "Mask candidate {} has shape {:?}, expected {:?}",
                    idx,
                    image.dimensions(),
                    source_dims
                );
            }
            Ok(None)
        }
    }
}

/// Collects mask candidates from the given directories, in order, without duplicates
pub fn mask_candidates(dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        for file in find_dicom_files(Path::new(dir))? {
            if !candidates.contains(&file) {
                candidates.push(file);
            }
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MammoprepError;
    use crate::extraction::loader::test_support::write_dicom;
    use tempfile::TempDir;

    fn make(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([value]))
    }

    fn loader(images: Vec<GrayImage>) -> impl FnMut(&usize) -> Result<GrayImage> {
        move |idx| Ok(images[*idx].clone())
    }

    #[test]
    fn test_single_candidate_returned_unconditionally() {
        let mask = select_aligned_mask(&[0], (500, 600), loader(vec![make(80, 120, 1)]))
            .unwrap()
            .unwrap();
        assert_eq!(mask.dimensions(), (80, 120));
    }

    #[test]
    fn test_matching_candidate_first() {
        // Shapes (600, 500) and (120, 80) as rows x columns
        let images = vec![make(500, 600, 1), make(80, 120, 2)];
        let mask = select_aligned_mask(&[0, 1], (500, 600), loader(images))
            .unwrap()
            .unwrap();
        assert_eq!(mask.get_pixel(0, 0).0[0], 1);
    }

    #[test]
    fn test_matching_candidate_second() {
        let images = vec![make(80, 120, 2), make(500, 600, 1)];
        let mask = select_aligned_mask(&[0, 1], (500, 600), loader(images))
            .unwrap()
            .unwrap();
        assert_eq!(mask.get_pixel(0, 0).0[0], 1);
    }

    #[test]
    fn test_both_match_returns_first() {
        let images = vec![make(50, 60, 1), make(50, 60, 2)];
        let mask = select_aligned_mask(&[0, 1], (50, 60), loader(images))
            .unwrap()
            .unwrap();
        assert_eq!(mask.get_pixel(0, 0).0[0], 1);
    }

    #[test]
    fn test_no_match_is_none() {
        let images = vec![make(10, 10, 1), make(20, 20, 2)];
        assert!(select_aligned_mask(&[0, 1], (50, 60), loader(images))
            .unwrap()
            .is_none());
        assert!(select_aligned_mask::<usize, _>(&[], (50, 60), loader(vec![]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_error_propagates() {
        let result = select_aligned_mask(&[0, 1], (5, 5), |_: &usize| {
            Err(MammoprepError::Decode("truncated".to_string()))
        });
        assert!(matches!(result, Err(MammoprepError::Decode(_))));
    }

    #[test]
    fn test_shape_match_resolver_on_files() {
        let dir = TempDir::new().unwrap();
        write_dicom(&dir.path().join("1-1.dcm"), 2, 2, &[0, 1, 2, 3], "MONOCHROME2", None);
        write_dicom(
            &dir.path().join("1-2.dcm"),
            4,
            3,
            &[0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0],
            "MONOCHROME2",
            None,
        );

        let candidates = mask_candidates(&[dir.path().to_path_buf(), dir.path().to_path_buf()]).unwrap();
        assert_eq!(candidates.len(), 2);

        let mask = ShapeMatchResolver
            .resolve(&candidates, (4, 3))
            .unwrap()
            .unwrap();
        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(mask.get_pixel(1, 1).0[0], 255);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
    }
}
