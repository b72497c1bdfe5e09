use crate::classify::Verdict;
use crate::pipeline::BoundingBox;
use crate::scoring::Strategy;
use image::DynamicImage;
use imageproc::point::Point;
use serde::Serialize;
use uuid::Uuid;

/// External contour of a foreground region, reduced to what the filters need
#[derive(Debug, Clone)]
pub struct SignatureContour {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// Polygon area enclosed by the border points (shoelace formula)
    pub area: f64,
}

impl SignatureContour {
    /// Summarize a border traced by `imageproc::contours::find_contours`.
    /// Returns None for an empty point list
    pub fn from_points(points: &[Point<u32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
            area: polygon_area(points),
        })
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_corners(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

fn polygon_area(points: &[Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    twice_area.abs() / 2.0
}

/// Result of extracting the signature from one image
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Colour crop containing the signature
    pub image: DynamicImage,
    /// Crop bounds in source-image coordinates
    pub region: BoundingBox,
    /// Searched band in source-image coordinates
    pub search_region: BoundingBox,
    /// True when no contour survived and the whole search region was returned
    pub fallback: bool,
}

impl Extraction {
    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary {
            region: self.region,
            search_region: self.search_region,
            fallback: self.fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub region: BoundingBox,
    pub search_region: BoundingBox,
    pub fallback: bool,
}

/// Outcome of comparing a reference signature with a sample
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub id: Uuid,
    pub strategy: Strategy,
    pub score: f64,
    /// `score * 100` rounded to two decimals
    pub score_percent: f64,
    pub verdict: Verdict,
    pub label: &'static str,
    pub reference: ExtractionSummary,
    pub sample: ExtractionSummary,
}

/// Round `score * 100` to two decimals
pub fn score_percent(score: f64) -> f64 {
    (score * 100.0 * 100.0).round() / 100.0
}
