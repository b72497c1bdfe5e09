use crate::classify::Thresholds;
use crate::error::{Result, SignatureError};
use crate::scoring::Strategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed output size for normalized crops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Horizontal band of the image to search, as fractions of its height.
/// `top = 0.4, bottom = 1.0` keeps the lower 60% (skips printed letterhead).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchRegion {
    pub top: f32,
    pub bottom: f32,
}

impl SearchRegion {
    pub fn lower(fraction: f32) -> Self {
        Self {
            top: 1.0 - fraction,
            bottom: 1.0,
        }
    }

    /// Pixel rows `[start, end)` covered in an image of the given height
    pub fn rows(&self, height: u32) -> (u32, u32) {
        let start = snap_to_row(self.top as f64 * height as f64).floor() as u32;
        let end = snap_to_row(self.bottom as f64 * height as f64).ceil() as u32;
        (start.min(height), end.min(height))
    }
}

/// f32 fractions like `1.0 - 0.6` land a hair off the row they name
fn snap_to_row(row: f64) -> f64 {
    let nearest = row.round();
    if (row - nearest).abs() < 1e-3 { nearest } else { row }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Gaussian sigma applied before thresholding
    pub blur_sigma: f32,
    /// Contours with a smaller polygon area (px²) are treated as specks
    pub min_contour_area: f64,
    /// Contours taller than this fraction of the search region are rejected
    pub max_height_fraction: f32,
    /// Margin added around the merged bounding box
    pub padding: u32,
    /// Return the whole search region when no contour survives filtering
    pub fallback_to_search_region: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_region: Option<SearchRegion>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            min_contour_area: 250.0,
            max_height_fraction: 0.4,
            padding: 10,
            fallback_to_search_region: true,
            search_region: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsimConfig {
    pub window_size: u32,
    pub canvas: Canvas,
    pub thresholds: Thresholds,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            window_size: 7,
            canvas: Canvas::new(500, 200),
            thresholds: Thresholds::ssim(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    pub max_features: usize,
    pub fast_threshold: u8,
    pub pyramid_levels: usize,
    pub scale_factor: f32,
    pub canvas: Canvas,
    pub thresholds: Thresholds,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            fast_threshold: 20,
            pyramid_levels: 8,
            scale_factor: 1.2,
            canvas: Canvas::new(500, 200),
            thresholds: Thresholds::orb(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Path to the twin-branch `.rten` model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    pub canvas: Canvas,
    pub thresholds: Thresholds,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            canvas: Canvas::new(220, 155),
            thresholds: Thresholds::embedding(),
        }
    }
}

/// Complete verifier configuration, loadable from TOML
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub strategy: Strategy,
    pub extraction: ExtractionConfig,
    pub ssim: SsimConfig,
    pub orb: OrbConfig,
    pub embedding: EmbeddingConfig,
}

impl VerifierConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SignatureError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SignatureError::InvalidConfig(e.to_string()))
    }

    /// Thresholds of the active strategy
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds_for(self.strategy)
    }

    pub fn thresholds_for(&self, strategy: Strategy) -> Thresholds {
        match strategy {
            Strategy::Ssim => self.ssim.thresholds,
            Strategy::Orb => self.orb.thresholds,
            Strategy::Embedding => self.embedding.thresholds,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ext = &self.extraction;
        if !(ext.blur_sigma > 0.0 && ext.blur_sigma.is_finite()) {
            return invalid(format!("blur_sigma must be positive, got {}", ext.blur_sigma));
        }
        if !(ext.min_contour_area.is_finite() && ext.min_contour_area >= 0.0) {
            return invalid(format!(
                "min_contour_area must be finite and not negative, got {}",
                ext.min_contour_area
            ));
        }
        if !(ext.max_height_fraction > 0.0 && ext.max_height_fraction <= 1.0) {
            return invalid(format!(
                "max_height_fraction must be in (0, 1], got {}",
                ext.max_height_fraction
            ));
        }
        if let Some(region) = ext.search_region {
            let in_range = |v: f32| (0.0..=1.0).contains(&v);
            if !in_range(region.top) || !in_range(region.bottom) || region.top >= region.bottom {
                return invalid(format!(
                    "search_region must satisfy 0 <= top < bottom <= 1, got {}..{}",
                    region.top, region.bottom
                ));
            }
        }

        for (name, canvas) in [
            ("ssim", self.ssim.canvas),
            ("orb", self.orb.canvas),
            ("embedding", self.embedding.canvas),
        ] {
            if canvas.width == 0 || canvas.height == 0 {
                return invalid(format!(
                    "{} canvas must be non-empty, got {}x{}",
                    name, canvas.width, canvas.height
                ));
            }
        }

        let window = self.ssim.window_size;
        if window < 3 || window % 2 == 0 {
            return invalid(format!("ssim window_size must be odd and >= 3, got {}", window));
        }
        if window > self.ssim.canvas.width || window > self.ssim.canvas.height {
            return invalid(format!(
                "ssim window_size {} exceeds canvas {}x{}",
                window, self.ssim.canvas.width, self.ssim.canvas.height
            ));
        }

        if self.orb.max_features == 0 || self.orb.pyramid_levels == 0 {
            return invalid("orb max_features and pyramid_levels must be positive".to_string());
        }
        if !(self.orb.scale_factor > 1.0 && self.orb.scale_factor.is_finite()) {
            return invalid(format!(
                "orb scale_factor must be greater than 1, got {}",
                self.orb.scale_factor
            ));
        }

        for (name, thresholds) in [
            ("ssim", self.ssim.thresholds),
            ("orb", self.orb.thresholds),
            ("embedding", self.embedding.thresholds),
        ] {
            if !(thresholds.strong.is_finite() && thresholds.weak.is_finite()) {
                return invalid(format!(
                    "{} thresholds must be finite, got strong {} weak {}",
                    name, thresholds.strong, thresholds.weak
                ));
            }
            if thresholds.weak > thresholds.strong {
                return invalid(format!(
                    "{} thresholds inverted: weak {} > strong {}",
                    name, thresholds.weak, thresholds.strong
                ));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> Result<()> {
    Err(SignatureError::InvalidConfig(message))
}
