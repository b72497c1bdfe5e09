#![allow(dead_code)]

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use sigverify::BoundingBox;
use std::io::Cursor;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const INK: Rgb<u8> = Rgb([20, 20, 40]);

/// Creates a blank white RGB image
pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, WHITE))
}

/// Creates a white image with one dark filled rectangle at `blob`
pub fn blob_image(width: u32, height: u32, blob: BoundingBox) -> DynamicImage {
    blobs_image(width, height, &[blob])
}

/// Creates a white image with a dark filled rectangle at each of `blobs`
pub fn blobs_image(width: u32, height: u32, blobs: &[BoundingBox]) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let inside = blobs
            .iter()
            .any(|b| x >= b.x && x <= b.max_x() && y >= b.y && y <= b.max_y());
        if inside { INK } else { WHITE }
    });
    DynamicImage::ImageRgb8(img)
}

/// The 500x200 "one black rectangle" fixture
pub fn rectangle_image() -> DynamicImage {
    blob_image(500, 200, rectangle_bounds())
}

pub fn rectangle_bounds() -> BoundingBox {
    BoundingBox {
        x: 200,
        y: 80,
        width: 80,
        height: 40,
    }
}

pub fn solid_gray(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
}

/// Deterministic blocky texture: 10px blocks of pseudo-random gray levels.
/// Block junctions give FAST plenty of distinct corners
pub fn textured_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    let img = GrayImage::from_fn(width, height, |x, y| {
        let (bx, by) = (x / 10, y / 10);
        let mut h = bx.wrapping_mul(73_856_093) ^ by.wrapping_mul(19_349_663) ^ seed.wrapping_mul(83_492_791);
        h ^= h >> 13;
        h = h.wrapping_mul(0x5bd1_e995);
        h ^= h >> 15;
        Luma([(h % 256) as u8])
    });
    DynamicImage::ImageLuma8(img)
}

/// Encodes an image as PNG bytes
pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}
