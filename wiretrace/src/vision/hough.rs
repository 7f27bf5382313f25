//! Progressive probabilistic Hough transform over a binary edge map.
//!
//! Edge pixels are visited in a shuffled order and vote into a (theta, rho)
//! accumulator. As soon as a bin reaches the vote threshold the line is
//! walked in both directions from the voting pixel, tolerating gaps of up to
//! `max_line_gap` pixels; the walked pixels are removed from the edge mask
//! and, for accepted segments, their votes are withdrawn.
//!
//! The shuffle uses a fixed-seed generator, so identical input always yields
//! identical segments.

use image::GrayImage;

use crate::config::DetectionConfig;
use crate::geometry::Point;
use crate::vision::segments::RawSegment;

const FIXED_SHIFT: u32 = 16;
const SHUFFLE_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Parameters of the line transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
    /// Distance resolution of the accumulator in pixels.
    pub rho: f64,
    /// Angle resolution of the accumulator in radians.
    pub theta: f64,
    /// Minimum votes for a line to be considered.
    pub threshold: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
    pub max_lines: usize,
}

impl HoughParams {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            rho: config.hough_rho,
            theta: config.hough_theta_degrees.to_radians(),
            threshold: config.hough_threshold,
            min_line_length: config.min_line_length,
            max_line_gap: config.max_line_gap,
            max_lines: config.max_lines,
        }
    }
}

impl Default for HoughParams {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

/// xorshift64 generator used only to order edge pixels.
struct Shuffle(u64);

impl Shuffle {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

struct Accumulator {
    trig: Vec<(f64, f64)>,
    numrho: usize,
    votes: Vec<i32>,
}

impl Accumulator {
    fn new(width: i64, height: i64, params: &HoughParams) -> Self {
        let irho = 1.0 / params.rho;
        let numangle = ((std::f64::consts::PI / params.theta).round() as usize).max(1);
        let numrho = ((((width + height) * 2 + 1) as f64) / params.rho).round() as usize;
        let trig = (0..numangle)
            .map(|n| {
                let angle = n as f64 * params.theta;
                (angle.cos() * irho, angle.sin() * irho)
            })
            .collect();
        Self {
            trig,
            numrho,
            votes: vec![0; numangle * numrho],
        }
    }

    fn bin(&self, n: usize, x: i64, y: i64) -> usize {
        let (c, s) = self.trig[n];
        let r = (x as f64 * c + y as f64 * s).round() as i64 + (self.numrho as i64 - 1) / 2;
        n * self.numrho + r.clamp(0, self.numrho as i64 - 1) as usize
    }

    /// Add the pixel's votes; returns the strongest bin touched and its count.
    fn vote(&mut self, x: i64, y: i64, floor: i32) -> (i32, usize) {
        let mut max_val = floor;
        let mut max_n = 0;
        for n in 0..self.trig.len() {
            let idx = self.bin(n, x, y);
            self.votes[idx] += 1;
            if self.votes[idx] > max_val {
                max_val = self.votes[idx];
                max_n = n;
            }
        }
        (max_val, max_n)
    }

    fn unvote(&mut self, x: i64, y: i64) {
        for n in 0..self.trig.len() {
            let idx = self.bin(n, x, y);
            self.votes[idx] -= 1;
        }
    }
}

/// Fixed-point stepping along a line direction.
struct Walk {
    xflag: bool,
    x0: i64,
    y0: i64,
    dx0: i64,
    dy0: i64,
}

impl Walk {
    fn new(x: i64, y: i64, a: f64, b: f64) -> Self {
        let one = f64::from(1u32 << FIXED_SHIFT);
        let half = 1i64 << (FIXED_SHIFT - 1);
        if a.abs() > b.abs() {
            Self {
                xflag: true,
                x0: x,
                y0: (y << FIXED_SHIFT) + half,
                dx0: if a > 0.0 { 1 } else { -1 },
                dy0: (b * one / a.abs()).round() as i64,
            }
        } else {
            Self {
                xflag: false,
                x0: (x << FIXED_SHIFT) + half,
                y0: y,
                dx0: (a * one / b.abs()).round() as i64,
                dy0: if b > 0.0 { 1 } else { -1 },
            }
        }
    }

    fn step(&self, k: usize) -> (i64, i64) {
        if k == 0 {
            (self.dx0, self.dy0)
        } else {
            (-self.dx0, -self.dy0)
        }
    }

    fn pixel(&self, x: i64, y: i64) -> (i64, i64) {
        if self.xflag {
            (x, y >> FIXED_SHIFT)
        } else {
            (x >> FIXED_SHIFT, y)
        }
    }
}

/// Extract line segments from an edge map (non-zero pixels are edges).
pub fn probabilistic_hough(edges: &GrayImage, params: &HoughParams) -> Vec<RawSegment> {
    let width = i64::from(edges.width());
    let height = i64::from(edges.height());
    let mut lines = Vec::new();
    if width == 0 || height == 0 || params.max_lines == 0 {
        return lines;
    }

    let idx = |x: i64, y: i64| (y * width + x) as usize;
    let in_bounds = |x: i64, y: i64| x >= 0 && y >= 0 && x < width && y < height;

    let mut mask = vec![false; (width * height) as usize];
    let mut points = Vec::new();
    for (x, y, px) in edges.enumerate_pixels() {
        if px[0] > 0 {
            let (x, y) = (i64::from(x), i64::from(y));
            mask[idx(x, y)] = true;
            points.push((x, y));
        }
    }

    let mut accumulator = Accumulator::new(width, height, params);
    let threshold = params.threshold as i32;
    let line_gap = i64::from(params.max_line_gap);
    let line_length = i64::from(params.min_line_length);
    let mut shuffle = Shuffle(SHUFFLE_SEED);
    let mut count = points.len();

    while count > 0 {
        let pick = shuffle.below(count);
        let (x, y) = points[pick];
        points[pick] = points[count - 1];
        count -= 1;

        // Already consumed by an earlier line.
        if !mask[idx(x, y)] {
            continue;
        }

        let (max_val, max_n) = accumulator.vote(x, y, threshold - 1);
        if max_val < threshold {
            continue;
        }

        let (c, s) = accumulator.trig[max_n];
        let walk = Walk::new(x, y, -s, c);

        let mut line_end = [(x, y); 2];
        for (k, end) in line_end.iter_mut().enumerate() {
            let (dx, dy) = walk.step(k);
            let (mut fx, mut fy) = (walk.x0, walk.y0);
            let mut gap = 0;
            loop {
                let (px, py) = walk.pixel(fx, fy);
                if !in_bounds(px, py) {
                    break;
                }
                if mask[idx(px, py)] {
                    gap = 0;
                    *end = (px, py);
                } else {
                    gap += 1;
                    if gap > line_gap {
                        break;
                    }
                }
                fx += dx;
                fy += dy;
            }
        }

        let good_line = (line_end[1].0 - line_end[0].0).abs() >= line_length
            || (line_end[1].1 - line_end[0].1).abs() >= line_length;

        for (k, end) in line_end.iter().enumerate() {
            let (dx, dy) = walk.step(k);
            let (mut fx, mut fy) = (walk.x0, walk.y0);
            loop {
                let (px, py) = walk.pixel(fx, fy);
                if !in_bounds(px, py) {
                    break;
                }
                let i = idx(px, py);
                if mask[i] {
                    if good_line {
                        accumulator.unvote(px, py);
                    }
                    mask[i] = false;
                }
                if (px, py) == *end {
                    break;
                }
                fx += dx;
                fy += dy;
            }
        }

        if good_line {
            lines.push(RawSegment::new(
                Point::new(line_end[0].0 as i32, line_end[0].1 as i32),
                Point::new(line_end[1].0 as i32, line_end[1].1 as i32),
            ));
            if lines.len() >= params.max_lines {
                break;
            }
        }
    }

    lines
}
