use crate::models::SignatureContour;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// Find the outermost borders in a binary image (foreground = non-zero).
/// Holes and borders nested inside other regions are skipped
pub fn find_external_contours(binary: &GrayImage) -> Vec<SignatureContour> {
    find_contours::<u32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| SignatureContour::from_points(&c.points))
        .collect()
}

/// Drop specks below `min_area` and blobs taller than `max_height_fraction` of the region
pub fn filter_contours(
    contours: &[SignatureContour],
    min_area: f64,
    max_height_fraction: f32,
    region_height: u32,
) -> Vec<SignatureContour> {
    let max_height = max_height_fraction as f64 * region_height as f64;
    contours
        .iter()
        .filter(|c| c.area() >= min_area && (c.height() as f64) <= max_height)
        .cloned()
        .collect()
}
