use crate::config::SearchRegion;
use crate::detection::{contours, preprocessing};
use crate::error::{Result, SignatureError};
use crate::pipeline::{BoundingBox, MetadataValue, PipelineContext, PipelineData, PipelineStep};
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use tracing::{debug, warn};

/// Metadata keys shared by the extraction steps
pub mod keys {
    pub const SEARCH_X: &str = "search_x";
    pub const SEARCH_Y: &str = "search_y";
    pub const SEARCH_WIDTH: &str = "search_width";
    pub const SEARCH_HEIGHT: &str = "search_height";
    pub const OTSU_LEVEL: &str = "otsu_level";
    pub const CONTOUR_AREA: &str = "contour_area";
    pub const CONTOURS_FOUND: &str = "contours_found";
    pub const CONTOURS_KEPT: &str = "contours_kept";
    pub const FALLBACK: &str = "fallback";
}

/// Restrict processing to a horizontal band of the image.
/// The band becomes the new `original`; its offset is kept in metadata
pub struct SearchRegionStep {
    pub region: Option<SearchRegion>,
}

impl PipelineStep for SearchRegionStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let (width, height) = item.original.dimensions();
            let (start, end) = match self.region {
                Some(region) => region.rows(height),
                None => (0, height),
            };
            if end <= start || width == 0 {
                warn!(input = %context.input, start, end, "search region is empty");
                return Err(SignatureError::NoSignatureDetected {
                    input: context.input.clone(),
                });
            }

            let band = Arc::new(item.original.crop_imm(0, start, width, end - start));
            let new_item = PipelineData {
                image: band.as_ref().clone(),
                original: band,
                bbox: None,
                metadata: item.metadata.clone(),
            }
            .with_metadata(keys::SEARCH_X, MetadataValue::Int(0))
            .with_metadata(keys::SEARCH_Y, MetadataValue::Int(start as i64))
            .with_metadata(keys::SEARCH_WIDTH, MetadataValue::Int(width as i64))
            .with_metadata(keys::SEARCH_HEIGHT, MetadataValue::Int((end - start) as i64));
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Search Region"
    }
}

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .iter()
            .map(|item| item.with_image(DynamicImage::ImageLuma8(preprocessing::to_grayscale(&item.image))))
            .collect())
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Apply Gaussian blur
pub struct BlurStep {
    pub sigma: f32,
}

impl PipelineStep for BlurStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = item.image.to_luma8();
            let blurred = preprocessing::apply_blur(&gray, self.sigma);
            result.push(item.with_image(DynamicImage::ImageLuma8(blurred)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Otsu inverse binarization: ink becomes white foreground
pub struct ThresholdStep;

impl PipelineStep for ThresholdStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = item.image.to_luma8();
            let (binary, level) = preprocessing::binarize_inverted(&gray);
            debug!(input = %context.input, level, "otsu threshold");
            result.push(
                item.with_image(DynamicImage::ImageLuma8(binary))
                    .with_metadata(keys::OTSU_LEVEL, MetadataValue::Int(level as i64)),
            );
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Otsu Threshold"
    }
}

/// Find external contours in the binary image - splits one image into one item per
/// surviving contour. When nothing survives the input item is passed on without a bbox
pub struct ContourDetectionStep {
    pub min_area: f64,
    pub max_height_fraction: f32,
}

impl PipelineStep for ContourDetectionStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let binary = item.image.to_luma8();
            let found = contours::find_external_contours(&binary);
            let kept = contours::filter_contours(
                &found,
                self.min_area,
                self.max_height_fraction,
                binary.height(),
            );

            debug!(
                input = %context.input,
                found = found.len(),
                kept = kept.len(),
                "contour filtering"
            );

            if kept.is_empty() {
                result.push(
                    item.with_metadata(keys::CONTOURS_FOUND, MetadataValue::Int(found.len() as i64))
                        .with_metadata(keys::CONTOURS_KEPT, MetadataValue::Int(0)),
                );
                continue;
            }

            // Each contour becomes its own PipelineData
            for contour in kept.iter() {
                let bbox = contour.bounding_box();
                let cropped = item.original.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);

                let mut contour_data = PipelineData::from_region(cropped, item.original.clone(), bbox);
                contour_data.metadata = item.metadata.clone();
                contour_data.metadata.insert(keys::CONTOUR_AREA.to_string(), MetadataValue::Float(contour.area()));
                contour_data.metadata.insert(keys::CONTOURS_FOUND.to_string(), MetadataValue::Int(found.len() as i64));
                contour_data.metadata.insert(keys::CONTOURS_KEPT.to_string(), MetadataValue::Int(kept.len() as i64));
                result.push(contour_data);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Contour Detection"
    }
}

/// Merge all contour regions into one padded box and crop the colour search region.
/// Without any region, either fall back to the whole search region or fail
pub struct RegionMergeStep {
    pub padding: u32,
    pub fallback_to_search_region: bool,
}

impl PipelineStep for RegionMergeStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let Some(first) = data.first() else {
            return Err(SignatureError::NoSignatureDetected {
                input: context.input.clone(),
            });
        };

        let original = first.original.clone();
        let (width, height) = original.dimensions();
        let merged = data
            .iter()
            .filter_map(|item| item.bbox)
            .reduce(|acc, bbox| acc.union(&bbox));

        let (bbox, fallback) = match merged {
            Some(bbox) => (bbox.padded(self.padding, width, height), false),
            None if self.fallback_to_search_region => {
                warn!(input = %context.input, "no contour survived filtering, using whole search region");
                (BoundingBox::full(width, height), true)
            }
            None => {
                warn!(input = %context.input, "no contour survived filtering");
                return Err(SignatureError::NoSignatureDetected {
                    input: context.input.clone(),
                });
            }
        };

        let cropped = original.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);
        let mut merged_item = PipelineData::from_region(cropped, original, bbox);
        merged_item.metadata = first.metadata.clone();
        merged_item.metadata.remove(keys::CONTOUR_AREA);
        merged_item
            .metadata
            .insert(keys::FALLBACK.to_string(), MetadataValue::Bool(fallback));

        Ok(vec![merged_item])
    }

    fn name(&self) -> &str {
        "Region Merge"
    }
}
