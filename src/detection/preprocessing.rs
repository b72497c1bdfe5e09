use crate::config::Canvas;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce scan noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Otsu binarization, inverted so dark ink strokes become foreground (255)
pub fn binarize_inverted(img: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(img);
    (threshold(img, level, ThresholdType::BinaryInverted), level)
}

/// Resize to the canvas exactly; aspect ratio is not preserved
pub fn resize_to_canvas(img: &DynamicImage, canvas: Canvas) -> DynamicImage {
    img.resize_exact(canvas.width, canvas.height, FilterType::Triangle)
}

/// Grayscale canvas used by the scorers
pub fn gray_canvas(img: &DynamicImage, canvas: Canvas) -> GrayImage {
    let gray = DynamicImage::ImageLuma8(to_grayscale(img));
    if gray.dimensions() == (canvas.width, canvas.height) {
        return gray.into_luma8();
    }
    resize_to_canvas(&gray, canvas).into_luma8()
}

/// Bring two crops of arbitrary size to the same canvas
pub fn normalize_pair(a: &DynamicImage, b: &DynamicImage, canvas: Canvas) -> (DynamicImage, DynamicImage) {
    (resize_to_canvas(a, canvas), resize_to_canvas(b, canvas))
}
