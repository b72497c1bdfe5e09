use crate::config::OrbConfig;
use crate::detection::preprocessing;
use crate::error::Result;
use crate::scoring::{SimilarityScorer, Strategy};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::corners::{corners_fast9, Corner};
use imageproc::filter::gaussian_blur_f32;
use imageproc::suppress::local_maxima;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;
use tracing::debug;

/// Radius of the orientation patch (31x31 patch)
const PATCH_RADIUS: i32 = 15;
/// Test pairs stay inside this radius so rotated samples never leave the patch
const PATTERN_RADIUS: i32 = 13;
/// Keypoints closer than this to the border are dropped
const EDGE: u32 = PATCH_RADIUS as u32 + 1;
const NMS_RADIUS: u32 = 3;
const DESCRIPTOR_BITS: usize = 256;
const PATTERN_SEED: u64 = 0x5167_0b5e;

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// FAST corner + orientation, in level-0 coordinates
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub response: f32,
    pub level: usize,
}

/// ORB keypoint match ratio over grayscale canvases
#[derive(Debug, Clone, Default)]
pub struct OrbScorer {
    config: OrbConfig,
}

impl OrbScorer {
    pub fn new(config: OrbConfig) -> Self {
        Self { config }
    }

    /// Oriented FAST keypoints and rotated BRIEF descriptors (same length)
    pub fn detect_and_describe(&self, img: &GrayImage) -> (Vec<Keypoint>, Vec<Descriptor>) {
        // (keypoint, x and y in its pyramid level)
        let mut candidates: Vec<(Keypoint, u32, u32)> = Vec::new();
        let mut levels: Vec<GrayImage> = Vec::new();

        let mut scale = 1.0f32;
        for level in 0..self.config.pyramid_levels {
            let width = (img.width() as f32 / scale).round() as u32;
            let height = (img.height() as f32 / scale).round() as u32;
            if width < 2 * EDGE + 1 || height < 2 * EDGE + 1 {
                break;
            }
            let level_img = if level == 0 {
                img.clone()
            } else {
                image::imageops::resize(img, width, height, FilterType::Triangle)
            };

            let corners = corners_fast9(&level_img, self.config.fast_threshold);
            let corners: Vec<Corner> = local_maxima(&corners, NMS_RADIUS)
                .into_iter()
                .filter(|c| c.x >= EDGE && c.y >= EDGE && c.x < width - EDGE && c.y < height - EDGE)
                .collect();

            for c in corners {
                let keypoint = Keypoint {
                    x: c.x as f32 * scale,
                    y: c.y as f32 * scale,
                    angle: intensity_centroid_angle(&level_img, c.x, c.y),
                    response: c.score,
                    level,
                };
                candidates.push((keypoint, c.x, c.y));
            }

            levels.push(level_img);
            scale *= self.config.scale_factor;
        }

        candidates.sort_by(|a, b| b.0.response.total_cmp(&a.0.response));
        candidates.truncate(self.config.max_features);

        let smoothed: Vec<GrayImage> = levels.iter().map(|l| gaussian_blur_f32(l, 2.0)).collect();
        candidates
            .into_iter()
            .map(|(kp, lx, ly)| {
                let descriptor = rotated_brief(&smoothed[kp.level], lx as i32, ly as i32, kp.angle);
                (kp, descriptor)
            })
            .unzip()
    }
}

impl SimilarityScorer for OrbScorer {
    fn strategy(&self) -> Strategy {
        Strategy::Orb
    }

    fn score(&self, a: &DynamicImage, b: &DynamicImage) -> Result<f64> {
        let gray_a = preprocessing::gray_canvas(a, self.config.canvas);
        let gray_b = preprocessing::gray_canvas(b, self.config.canvas);
        let (kps_a, desc_a) = self.detect_and_describe(&gray_a);
        let (kps_b, desc_b) = self.detect_and_describe(&gray_b);

        if desc_a.is_empty() || desc_b.is_empty() {
            debug!(keypoints_a = kps_a.len(), keypoints_b = kps_b.len(), "no descriptors, scoring 0");
            return Ok(0.0);
        }

        let matches = cross_check_matches(&desc_a, &desc_b);
        let score = matches.len() as f64 / kps_a.len().max(kps_b.len()) as f64;
        debug!(
            keypoints_a = kps_a.len(),
            keypoints_b = kps_b.len(),
            matches = matches.len(),
            score,
            "orb match ratio"
        );
        Ok(score)
    }
}

pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Index of the nearest descriptor in `pool` (first one wins ties)
fn nearest(query: &Descriptor, pool: &[Descriptor]) -> Option<usize> {
    pool.iter()
        .enumerate()
        .min_by_key(|(idx, d)| (hamming_distance(query, d), *idx))
        .map(|(idx, _)| idx)
}

/// Brute-force Hamming matching keeping only mutual nearest neighbours.
/// Returns `(index_in_a, index_in_b)` pairs
pub fn cross_check_matches(a: &[Descriptor], b: &[Descriptor]) -> Vec<(usize, usize)> {
    let b_to_a: Vec<Option<usize>> = b.iter().map(|d| nearest(d, a)).collect();
    a.iter()
        .enumerate()
        .filter_map(|(ia, d)| {
            let ib = nearest(d, b)?;
            (b_to_a[ib] == Some(ia)).then_some((ia, ib))
        })
        .collect()
}

/// Orientation from the intensity centroid of a circular patch
fn intensity_centroid_angle(img: &GrayImage, cx: u32, cy: u32) -> f32 {
    let (mut m10, mut m01) = (0i64, 0i64);
    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        for dx in -PATCH_RADIUS..=PATCH_RADIUS {
            if dx * dx + dy * dy > PATCH_RADIUS * PATCH_RADIUS {
                continue;
            }
            let value = sample(img, cx as i32 + dx, cy as i32 + dy) as i64;
            m10 += dx as i64 * value;
            m01 += dy as i64 * value;
        }
    }
    if m10 == 0 && m01 == 0 {
        0.0
    } else {
        (m01 as f32).atan2(m10 as f32)
    }
}

fn rotated_brief(img: &GrayImage, cx: i32, cy: i32, angle: f32) -> Descriptor {
    let (s, c) = angle.sin_cos();
    let rotate = |dx: i32, dy: i32| {
        let rx = (c * dx as f32 - s * dy as f32).round() as i32;
        let ry = (s * dx as f32 + c * dy as f32).round() as i32;
        (cx + rx, cy + ry)
    };

    let mut d = [0u8; 32];
    for (i, &(x1, y1, x2, y2)) in test_pattern().iter().enumerate() {
        let (px1, py1) = rotate(x1, y1);
        let (px2, py2) = rotate(x2, y2);
        let bit = (sample(img, px1, py1) < sample(img, px2, py2)) as u8;
        d[i / 8] |= bit << (i % 8);
    }
    d
}

/// Fixed BRIEF test pairs inside a disc of `PATTERN_RADIUS`
fn test_pattern() -> &'static [(i32, i32, i32, i32)] {
    static PATTERN: OnceLock<Vec<(i32, i32, i32, i32)>> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let mut point = || loop {
            let x = rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
            let y = rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
            if x * x + y * y <= PATTERN_RADIUS * PATTERN_RADIUS {
                return (x, y);
            }
        };
        (0..DESCRIPTOR_BITS)
            .map(|_| {
                let (x1, y1) = point();
                let (x2, y2) = point();
                (x1, y1, x2, y2)
            })
            .collect()
    })
}

/// Pixel value with coordinates clamped to the image
fn sample(img: &GrayImage, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, img.width() as i32 - 1) as u32;
    let y = y.clamp(0, img.height() as i32 - 1) as u32;
    img.get_pixel(x, y)[0]
}
