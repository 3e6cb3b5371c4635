pub mod loader;
pub mod mask;
pub mod tags;
pub mod voi;

pub use loader::{find_dicom_files, find_image_file, load_dicom_image, to_display_image};
pub use mask::{mask_candidates, select_aligned_mask, MaskResolver, ShapeMatchResolver};
pub use tags::*;
pub use voi::{voi_lut_option, VoiLut};
