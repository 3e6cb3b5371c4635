use image::imageops;
use image::{DynamicImage, ImageBuffer, Luma, Pixel};
use imageproc::definitions::Clamp;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{warp_with, Interpolation};
use rand::Rng;

/// Probability of each augmentation operator
pub const DEFAULT_PROBABILITY: f64 = 0.5;

/// Scale of the elastic displacement field, in pixels
pub const ELASTIC_ALPHA: f32 = 10.0;

/// Smoothing of the elastic displacement field
pub const ELASTIC_SIGMA: f32 = 50.0;

/// Keeps bilinear pre-images inside the last row and column
const EDGE_EPSILON: f32 = 1e-3;

type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Random augmentation of prepared training images
///
/// Each operator fires independently with the configured probability, in
/// order: horizontal flip, vertical flip, elastic deformation.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use mammoprep_core::processing::Augmenter;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let image = GrayImage::from_fn(32, 32, |x, _| Luma([x as u8]));
/// let augmented = Augmenter::default().augment(&image, &mut StdRng::seed_from_u64(1));
/// assert_eq!(augmented.dimensions(), (32, 32));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Augmenter {
    probability: f64,
    alpha: f32,
    sigma: f32,
}

impl Default for Augmenter {
    fn default() -> Self {
        Self {
            probability: DEFAULT_PROBABILITY,
            alpha: ELASTIC_ALPHA,
            sigma: ELASTIC_SIGMA,
        }
    }
}

impl Augmenter {
    /// Sets the probability of every operator, clamped to [0, 1]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_elastic(mut self, alpha: f32, sigma: f32) -> Self {
        self.alpha = alpha;
        self.sigma = sigma;
        self
    }

    pub fn augment<P, R>(&self, image: &Image<P>, rng: &mut R) -> Image<P>
    where
        P: Pixel + Send + Sync + 'static,
        P::Subpixel: Send + Sync + Into<f32> + Clamp<f32> + 'static,
        R: Rng + ?Sized,
    {
        let mut out = image.clone();
        if rng.gen_bool(self.probability) {
            out = imageops::flip_horizontal(&out);
        }
        if rng.gen_bool(self.probability) {
            out = imageops::flip_vertical(&out);
        }
        if rng.gen_bool(self.probability) {
            out = elastic_transform(&out, self.alpha, self.sigma, rng);
        }
        out
    }

    /// Augments a decoded PNG, keeping grayscale and RGB images as they are
    pub fn augment_dynamic<R: Rng + ?Sized>(&self, image: &DynamicImage, rng: &mut R) -> DynamicImage {
        match image {
            DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(self.augment(gray, rng)),
            DynamicImage::ImageRgb8(rgb) => DynamicImage::ImageRgb8(self.augment(rgb, rng)),
            other => DynamicImage::ImageRgb8(self.augment(&other.to_rgb8(), rng)),
        }
    }
}

/// Elastic deformation with a smoothed random displacement field
///
/// Each pixel is sampled at its position shifted by `alpha` times a
/// uniform [-1, 1] field blurred with a Gaussian of `sigma`. Samples are
/// interpolated bilinearly and clamped to the image, so borders replicate.
pub fn elastic_transform<P, R>(image: &Image<P>, alpha: f32, sigma: f32, rng: &mut R) -> Image<P>
where
    P: Pixel + Send + Sync,
    P::Subpixel: Send + Sync + Into<f32> + Clamp<f32>,
    R: Rng + ?Sized,
{
    let (width, height) = image.dimensions();
    if width < 2 || height < 2 {
        return image.clone();
    }

    let dx = displacement_field(width, height, alpha, sigma, rng);
    let dy = displacement_field(width, height, alpha, sigma, rng);
    let max_x = (width - 1) as f32 - EDGE_EPSILON;
    let max_y = (height - 1) as f32 - EDGE_EPSILON;

    warp_with(
        image,
        |x, y| {
            let (col, row) = ((x as u32).min(width - 1), (y as u32).min(height - 1));
            let sx = x + dx.get_pixel(col, row).0[0];
            let sy = y + dy.get_pixel(col, row).0[0];
            (sx.clamp(0.0, max_x), sy.clamp(0.0, max_y))
        },
        Interpolation::Bilinear,
        *image.get_pixel(0, 0),
    )
}

fn displacement_field<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    alpha: f32,
    sigma: f32,
    rng: &mut R,
) -> ImageBuffer<Luma<f32>, Vec<f32>> {
    let noise: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |_, _| Luma([rng.gen_range(-1.0..=1.0)]));
    let mut field = if sigma > 0.0 {
        gaussian_blur_f32(&noise, sigma)
    } else {
        noise
    };
    for p in field.pixels_mut() {
        p.0[0] *= alpha;
    }
    field
}
