use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Contrast-limited adaptive histogram equalization
///
/// The image is split into a `grid` x `grid` array of tiles. Each tile gets
/// its own equalization lookup table built from a histogram clipped at
/// `clip_limit` times the mean bin height, with the clipped excess spread
/// back over all bins. Pixels are mapped by bilinear interpolation between
/// the lookup tables of the four nearest tile centres.
///
/// A `clip_limit` of 0 or less disables clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clahe {
    pub clip_limit: f64,
    pub grid: u32,
}

impl Clahe {
    pub const DEFAULT_GRID: u32 = 8;

    pub fn new(clip_limit: f64) -> Self {
        Self {
            clip_limit,
            grid: Self::DEFAULT_GRID,
        }
    }

    pub fn with_grid(mut self, grid: u32) -> Self {
        self.grid = grid.max(1);
        self
    }

    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }
        let grid_x = self.grid.clamp(1, width);
        let grid_y = self.grid.clamp(1, height);

        let luts = self.tile_luts(image, grid_x, grid_y);
        let lut = |tx: u32, ty: u32| &luts[(ty * grid_x + tx) as usize];

        let tile_w = f64::from(width) / f64::from(grid_x);
        let tile_h = f64::from(height) / f64::from(grid_y);

        GrayImage::from_fn(width, height, |x, y| {
            let v = image.get_pixel(x, y).0[0] as usize;

            let (tx0, tx1, wx) = neighbours(f64::from(x), tile_w, grid_x);
            let (ty0, ty1, wy) = neighbours(f64::from(y), tile_h, grid_y);

            let top = lut(tx0, ty0)[v] * (1.0 - wx) + lut(tx1, ty0)[v] * wx;
            let bottom = lut(tx0, ty1)[v] * (1.0 - wx) + lut(tx1, ty1)[v] * wx;
            let mapped = top * (1.0 - wy) + bottom * wy;
            Luma([mapped.round().clamp(0.0, 255.0) as u8])
        })
    }

    /// Builds one lookup table per tile, row-major
    fn tile_luts(&self, image: &GrayImage, grid_x: u32, grid_y: u32) -> Vec<[f64; BINS]> {
        let (width, height) = image.dimensions();
        let mut luts = Vec::with_capacity((grid_x * grid_y) as usize);

        for ty in 0..grid_y {
            let y0 = tile_start(ty, height, grid_y);
            let y1 = tile_start(ty + 1, height, grid_y);
            for tx in 0..grid_x {
                let x0 = tile_start(tx, width, grid_x);
                let x1 = tile_start(tx + 1, width, grid_x);

                let mut hist = [0u32; BINS];
                for y in y0..y1 {
                    for x in x0..x1 {
                        hist[image.get_pixel(x, y).0[0] as usize] += 1;
                    }
                }
                let area = (x1 - x0) * (y1 - y0);
                if self.clip_limit > 0.0 {
                    let limit = (self.clip_limit * f64::from(area) / BINS as f64).max(1.0) as u32;
                    clip_histogram(&mut hist, limit);
                }
                luts.push(cumulative_lut(&hist, area));
            }
        }
        luts
    }
}

fn tile_start(index: u32, size: u32, grid: u32) -> u32 {
    (u64::from(index) * u64::from(size) / u64::from(grid)) as u32
}

/// Returns the two tile indices around `pos` and the weight of the second
fn neighbours(pos: f64, tile_size: f64, grid: u32) -> (u32, u32, f64) {
    let t = (pos + 0.5) / tile_size - 0.5;
    let last = f64::from(grid - 1);
    if t <= 0.0 {
        return (0, 0, 0.0);
    }
    if t >= last {
        return (grid - 1, grid - 1, 0.0);
    }
    let lo = t.floor();
    (lo as u32, lo as u32 + 1, t - lo)
}

/// Clips bins above `limit` and redistributes the excess uniformly
fn clip_histogram(hist: &mut [u32; BINS], limit: u32) {
    let mut excess: u32 = 0;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let batch = excess / BINS as u32;
    let residual = (excess % BINS as u32) as usize;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }
}

fn cumulative_lut(hist: &[u32; BINS], area: u32) -> [f64; BINS] {
    let scale = 255.0 / f64::from(area.max(1));
    let mut lut = [0.0; BINS];
    let mut sum: u64 = 0;
    for (entry, count) in lut.iter_mut().zip(hist.iter()) {
        sum += u64::from(*count);
        *entry = (sum as f64 * scale).round().min(255.0);
    }
    lut
}

/// Applies CLAHE with the default 8x8 tile grid
pub fn clahe(image: &GrayImage, clip_limit: f64) -> GrayImage {
    Clahe::new(clip_limit).apply(image)
}
