use crate::config::SsimConfig;
use crate::detection::preprocessing;
use crate::error::{Result, SignatureError};
use crate::scoring::{SimilarityScorer, Strategy};
use image::{DynamicImage, GrayImage};

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DYNAMIC_RANGE: f64 = 255.0;

/// Structural similarity over grayscale canvases
#[derive(Debug, Clone, Default)]
pub struct SsimScorer {
    config: SsimConfig,
}

impl SsimScorer {
    pub fn new(config: SsimConfig) -> Self {
        Self { config }
    }
}

impl SimilarityScorer for SsimScorer {
    fn strategy(&self) -> Strategy {
        Strategy::Ssim
    }

    fn score(&self, a: &DynamicImage, b: &DynamicImage) -> Result<f64> {
        let (a, b) = preprocessing::normalize_pair(a, b, self.config.canvas);
        structural_similarity(
            &preprocessing::to_grayscale(&a),
            &preprocessing::to_grayscale(&b),
            self.config.window_size,
        )
    }
}

/// Mean SSIM over every `window` x `window` block fully inside both images.
/// Uses a uniform window and sample (N - 1) covariance normalization
pub fn structural_similarity(a: &GrayImage, b: &GrayImage, window: u32) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(SignatureError::InvalidConfig(format!(
            "SSIM needs equal dimensions, got {:?} and {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let (width, height) = a.dimensions();
    if window == 0 || window > width || window > height {
        return Err(SignatureError::InvalidConfig(format!(
            "SSIM window {} does not fit a {}x{} image",
            window, width, height
        )));
    }

    let tables = SummedTables::build(a, b);
    let n = (window * window) as f64;
    let cov_norm = if n > 1.0 { n / (n - 1.0) } else { 1.0 };
    let c1 = (K1 * DYNAMIC_RANGE).powi(2);
    let c2 = (K2 * DYNAMIC_RANGE).powi(2);

    let mut total = 0.0f64;
    let mut count = 0u64;
    for y in 0..=(height - window) {
        for x in 0..=(width - window) {
            let s = tables.window_sums(x, y, window);
            let ux = s.a as f64 / n;
            let uy = s.b as f64 / n;
            let uxx = s.aa as f64 / n;
            let uyy = s.bb as f64 / n;
            let uxy = s.ab as f64 / n;
            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    Ok(total / count as f64)
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct WindowSums {
    a: i64,
    b: i64,
    aa: i64,
    bb: i64,
    ab: i64,
}

/// Integral images of a, b, a², b² and a·b with a zero first row/column
struct SummedTables {
    stride: usize,
    cells: Vec<WindowSums>,
}

impl SummedTables {
    fn build(a: &GrayImage, b: &GrayImage) -> Self {
        let (width, height) = a.dimensions();
        let stride = width as usize + 1;
        let mut cells = vec![WindowSums::default(); stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row = WindowSums::default();
            for x in 0..width as usize {
                let pa = a.get_pixel(x as u32, y as u32)[0] as i64;
                let pb = b.get_pixel(x as u32, y as u32)[0] as i64;
                row.a += pa;
                row.b += pb;
                row.aa += pa * pa;
                row.bb += pb * pb;
                row.ab += pa * pb;

                let above = cells[y * stride + x + 1];
                cells[(y + 1) * stride + x + 1] = WindowSums {
                    a: above.a + row.a,
                    b: above.b + row.b,
                    aa: above.aa + row.aa,
                    bb: above.bb + row.bb,
                    ab: above.ab + row.ab,
                };
            }
        }

        Self { stride, cells }
    }

    fn window_sums(&self, x: u32, y: u32, window: u32) -> WindowSums {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + window as usize, y0 + window as usize);
        let at = |cx: usize, cy: usize| self.cells[cy * self.stride + cx];
        let (br, tr, bl, tl) = (at(x1, y1), at(x1, y0), at(x0, y1), at(x0, y0));
        WindowSums {
            a: br.a - tr.a - bl.a + tl.a,
            b: br.b - tr.b - bl.b + tl.b,
            aa: br.aa - tr.aa - bl.aa + tl.aa,
            bb: br.bb - tr.bb - bl.bb + tl.bb,
            ab: br.ab - tr.ab - bl.ab + tl.ab,
        }
    }
}
