//! Synthetic schematic drawing shared by the integration tests.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use wiretrace::{BoundingBox, ComponentType, DetectedComponent};

pub fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Black horizontal stroke `thickness` pixels tall, centered on `y`.
pub fn hline(img: &mut GrayImage, x0: u32, x1: u32, y: u32, thickness: u32) {
    let top = y - thickness / 2;
    for yy in top..top + thickness {
        for x in x0..=x1 {
            img.put_pixel(x, yy, Luma([0]));
        }
    }
}

/// Black vertical stroke `thickness` pixels wide, centered on `x`.
pub fn vline(img: &mut GrayImage, x: u32, y0: u32, y1: u32, thickness: u32) {
    let left = x - thickness / 2;
    for xx in left..left + thickness {
        for y in y0..=y1 {
            img.put_pixel(xx, y, Luma([0]));
        }
    }
}

pub fn encode_png(img: &GrayImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

pub fn resistor(id: &str, x1: f64, y1: f64, x2: f64, y2: f64, value: &str) -> DetectedComponent {
    DetectedComponent::new(id, BoundingBox::new(x1, y1, x2, y2), ComponentType::Resistor)
        .with_designation(id)
        .with_value(value)
}

/// R1 and R2 side by side; the gap between R1's right pin (150, 100) and
/// R2's left pin (250, 100) is where the wire goes.
pub fn series_components() -> Vec<DetectedComponent> {
    vec![
        resistor("R1", 50.0, 90.0, 150.0, 110.0, "10kΩ"),
        resistor("R2", 250.0, 90.0, 350.0, 110.0, "4k7"),
    ]
}

/// 400x200 page with a single 3px wire joining the two resistors.
pub fn series_image() -> GrayImage {
    let mut img = blank(400, 200);
    hline(&mut img, 152, 248, 100, 3);
    img
}
