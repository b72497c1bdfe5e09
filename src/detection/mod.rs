pub mod preprocessing;
pub mod contours;
pub mod steps;

use crate::config::{ExtractionConfig, SearchRegion};
use crate::error::{Result, SignatureError};
use crate::models::Extraction;
use crate::pipeline::{BoundingBox, Pipeline};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use steps::*;

/// Locates the handwritten mark in an image and crops it
#[derive(Debug, Clone, Default)]
pub struct SignatureExtractor {
    config: ExtractionConfig,
}

impl SignatureExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Build the extraction pipeline for one input
    pub fn pipeline(&self, input: &str, debug_dir: Option<PathBuf>) -> Result<Pipeline> {
        let pipeline = build_extraction_pipeline(&self.config).with_input(input);
        match debug_dir {
            Some(dir) => pipeline.with_debug(dir),
            None => Ok(pipeline),
        }
    }

    pub fn extract(&self, img: &DynamicImage) -> Result<Extraction> {
        self.extract_labeled(img, "input", None)
    }

    /// Extract with an input label (used in errors and logs) and optional debug output
    pub fn extract_labeled(
        &self,
        img: &DynamicImage,
        input: &str,
        debug_dir: Option<PathBuf>,
    ) -> Result<Extraction> {
        let pipeline = self.pipeline(input, debug_dir)?;
        let mut results = pipeline.run(img.clone())?;

        let no_signature = || SignatureError::NoSignatureDetected {
            input: input.to_string(),
        };
        let item = results.pop().ok_or_else(no_signature)?;
        let bbox = item.bbox.ok_or_else(no_signature)?;
        if bbox.is_empty() {
            return Err(no_signature());
        }

        let offset_x = item.get_int(keys::SEARCH_X).unwrap_or(0) as u32;
        let offset_y = item.get_int(keys::SEARCH_Y).unwrap_or(0) as u32;
        let search_region = BoundingBox {
            x: offset_x,
            y: offset_y,
            width: item.original.width(),
            height: item.original.height(),
        };
        let fallback = item.get_bool(keys::FALLBACK).unwrap_or(false);

        Ok(Extraction {
            image: item.image,
            region: bbox.offset(offset_x, offset_y),
            search_region,
            fallback,
        })
    }
}

/// Extract the signature from `img`, optionally restricted to a search region
pub fn extract_signature(img: &DynamicImage, roi: Option<SearchRegion>) -> Result<Extraction> {
    let config = ExtractionConfig {
        search_region: roi,
        ..ExtractionConfig::default()
    };
    SignatureExtractor::new(config).extract(img)
}

/// Build the standard extraction pipeline from configuration
pub fn build_extraction_pipeline(config: &ExtractionConfig) -> Pipeline {
    Pipeline::new()
        .add_step(Arc::new(SearchRegionStep {
            region: config.search_region,
        }))
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(BlurStep {
            sigma: config.blur_sigma,
        }))
        .add_step(Arc::new(ThresholdStep))
        .add_step(Arc::new(ContourDetectionStep {
            min_area: config.min_contour_area,
            max_height_fraction: config.max_height_fraction,
        }))
        .add_step(Arc::new(RegionMergeStep {
            padding: config.padding,
            fallback_to_search_region: config.fallback_to_search_region,
        }))
}
