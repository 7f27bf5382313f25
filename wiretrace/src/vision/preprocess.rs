//! Raster preprocessing ahead of line detection.
//!
//! Blur, inverted adaptive threshold (ink becomes 255), morphological
//! closing and a boundary edge map, all over single-channel `GrayImage`s.

use image::{DynamicImage, GrayImage, Luma};

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Convert any decoded image to 8-bit grayscale.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Gaussian blur for noise suppression. A non-positive sigma is a no-op.
pub fn gaussian_blur(gray: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return gray.clone();
    }
    image::imageops::blur(gray, sigma)
}

/// Summed-area table with one row/column of zero padding.
struct IntegralImage {
    width: usize,
    sums: Vec<u64>,
}

impl IntegralImage {
    fn new(gray: &GrayImage) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let stride = w + 1;
        let mut sums = vec![0u64; stride * (h + 1)];
        for y in 0..h {
            let mut row = 0u64;
            for x in 0..w {
                row += u64::from(gray.get_pixel(x as u32, y as u32)[0]);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { width: w, sums }
    }

    /// Sum over the inclusive rectangle `[x0, x1] x [y0, y1]`.
    fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let stride = self.width + 1;
        let a = self.sums[y0 * stride + x0];
        let b = self.sums[y0 * stride + x1 + 1];
        let c = self.sums[(y1 + 1) * stride + x0];
        let d = self.sums[(y1 + 1) * stride + x1 + 1];
        d + a - b - c
    }
}

/// Inverted local-mean threshold: a pixel becomes foreground when it is at
/// least `offset` darker than the mean of its `block_size` window.
///
/// Windows are clipped at the image border, so uneven illumination across
/// a scan does not swamp faint strokes.
pub fn adaptive_threshold_inv(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    let integral = IntegralImage::new(gray);
    let radius = (block_size / 2) as usize;
    let (wu, hu) = (w as usize, h as usize);

    for y in 0..hu {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(hu - 1);
        for x in 0..wu {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(wu - 1);
            let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f32;
            let mean = integral.sum(x0, y0, x1, y1) as f32 / count;
            let value = f32::from(gray.get_pixel(x as u32, y as u32)[0]);
            let level = if value <= mean - offset { FOREGROUND } else { BACKGROUND };
            out.put_pixel(x as u32, y as u32, Luma([level]));
        }
    }
    out
}

/// Square structuring element offsets, anchored like a centered kernel.
fn kernel_offsets(kernel: u32) -> std::ops::RangeInclusive<i64> {
    let k = i64::from(kernel.max(1));
    let anchor = k / 2;
    -anchor..=(k - 1 - anchor)
}

fn dilate(binary: &GrayImage, kernel: u32) -> GrayImage {
    let (w, h) = binary.dimensions();
    let offsets = kernel_offsets(kernel);
    GrayImage::from_fn(w, h, |x, y| {
        for dy in offsets.clone() {
            for dx in offsets.clone() {
                let (sx, sy) = (i64::from(x) + dx, i64::from(y) + dy);
                if sx < 0 || sy < 0 || sx >= i64::from(w) || sy >= i64::from(h) {
                    continue;
                }
                if binary.get_pixel(sx as u32, sy as u32)[0] == FOREGROUND {
                    return Luma([FOREGROUND]);
                }
            }
        }
        Luma([BACKGROUND])
    })
}

fn erode(binary: &GrayImage, kernel: u32) -> GrayImage {
    let (w, h) = binary.dimensions();
    let offsets = kernel_offsets(kernel);
    GrayImage::from_fn(w, h, |x, y| {
        for dy in offsets.clone() {
            for dx in offsets.clone() {
                // Reflected structuring element.
                let (sx, sy) = (i64::from(x) - dx, i64::from(y) - dy);
                // Outside the image counts as foreground so borders do not erode.
                if sx < 0 || sy < 0 || sx >= i64::from(w) || sy >= i64::from(h) {
                    continue;
                }
                if binary.get_pixel(sx as u32, sy as u32)[0] != FOREGROUND {
                    return Luma([BACKGROUND]);
                }
            }
        }
        Luma([FOREGROUND])
    })
}

/// Morphological closing (dilate, then erode). Bridges gaps narrower than
/// the kernel in hand-drawn strokes.
pub fn morphological_close(binary: &GrayImage, kernel: u32) -> GrayImage {
    if kernel <= 1 {
        return binary.clone();
    }
    erode(&dilate(binary, kernel), kernel)
}

/// Edge map of a binary image: foreground pixels with at least one
/// 4-connected background neighbour.
pub fn boundary_edges(binary: &GrayImage) -> GrayImage {
    let (w, h) = binary.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        if binary.get_pixel(x, y)[0] != FOREGROUND {
            return Luma([BACKGROUND]);
        }
        let neighbours = [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)];
        let on_boundary = neighbours.iter().any(|&(dx, dy)| {
            let (sx, sy) = (i64::from(x) + dx, i64::from(y) + dy);
            if sx < 0 || sy < 0 || sx >= i64::from(w) || sy >= i64::from(h) {
                return false;
            }
            binary.get_pixel(sx as u32, sy as u32)[0] != FOREGROUND
        });
        Luma([if on_boundary { FOREGROUND } else { BACKGROUND }])
    })
}

/// True when the pixel at `(x, y)` is inside the image and darker than `threshold`.
pub fn is_dark(gray: &GrayImage, x: i32, y: i32, threshold: u8) -> bool {
    if x < 0 || y < 0 || x as u32 >= gray.width() || y as u32 >= gray.height() {
        return false;
    }
    gray.get_pixel(x as u32, y as u32)[0] < threshold
}
