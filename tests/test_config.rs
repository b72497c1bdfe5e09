mod common;

use common::*;
use std::path::PathBuf;

#[test]
fn partial_file_keeps_defaults() -> anyhow::Result<()> {
    let config = VerifierConfig::from_toml_str(
        r#"
strategy = "orb"

[extraction]
padding = 4

[extraction.search_region]
top = 0.4
bottom = 1.0

[orb.thresholds]
strong = 0.5
weak = 0.25
"#,
    )?;

    assert_eq!(config.strategy, Strategy::Orb);
    assert_eq!(config.extraction.padding, 4);
    assert_eq!(config.extraction.blur_sigma, ExtractionConfig::default().blur_sigma);
    assert_eq!(config.extraction.search_region, Some(SearchRegion { top: 0.4, bottom: 1.0 }));
    assert_eq!(config.thresholds().strong, 0.5);
    assert!(!config.thresholds().inclusive);
    assert_eq!(config.ssim.window_size, 7);
    Ok(())
}

#[test]
fn empty_file_is_the_default() -> anyhow::Result<()> {
    assert_eq!(VerifierConfig::from_toml_str("")?, VerifierConfig::default());
    Ok(())
}

#[test]
fn serialized_config_loads_back() -> anyhow::Result<()> {
    let mut config = VerifierConfig::default();
    config.strategy = Strategy::Embedding;
    config.embedding.model_path = Some(PathBuf::from("models/twin.rten"));
    config.extraction.search_region = Some(SearchRegion::lower(0.5));

    let text = config.to_toml_string()?;

    assert_eq!(VerifierConfig::from_toml_str(&text)?, config);
    Ok(())
}

#[test]
fn load_reads_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("sigverify.toml");
    std::fs::write(&path, "[ssim]\nwindow_size = 11\n")?;

    let config = VerifierConfig::load(&path)?;

    assert_eq!(config.ssim.window_size, 11);
    Ok(())
}

fn rejected(text: &str) -> bool {
    matches!(VerifierConfig::from_toml_str(text), Err(SignatureError::InvalidConfig(_)))
}

#[test]
fn invalid_values_are_rejected() {
    assert!(rejected("strategy = \"llm\""));
    assert!(rejected("[extraction]\nblur_sigma = 0.0"));
    assert!(rejected("[extraction]\nmax_height_fraction = 1.5"));
    assert!(rejected("[extraction.search_region]\ntop = 0.6\nbottom = 0.6"));
    assert!(rejected("[extraction.search_region]\ntop = -0.1\nbottom = 0.5"));
    assert!(rejected("[ssim]\nwindow_size = 8"));
    assert!(rejected("[ssim]\nwindow_size = 1"));
    assert!(rejected("[ssim.canvas]\nwidth = 0\nheight = 200"));
    assert!(rejected("[orb]\nscale_factor = 1.0"));
    assert!(rejected("[embedding.thresholds]\nstrong = 0.5\nweak = 0.8"));
}

#[test]
fn window_must_fit_the_canvas() {
    assert!(rejected("[ssim]\nwindow_size = 9\n[ssim.canvas]\nwidth = 8\nheight = 8"));
}

#[test]
fn lower_band_starts_on_the_named_row() {
    assert_eq!(SearchRegion::lower(0.6).rows(200), (80, 200));
    assert_eq!(SearchRegion::lower(0.7).rows(1000), (300, 1000));
    assert_eq!(SearchRegion { top: 0.25, bottom: 0.75 }.rows(10), (2, 8));
}

#[test]
fn non_finite_values_are_rejected() {
    assert!(rejected("[extraction]\nmin_contour_area = nan"));
    assert!(rejected("[extraction]\nblur_sigma = inf"));
    assert!(rejected("[ssim.thresholds]\nstrong = nan\nweak = 0.5"));
    assert!(rejected("[orb.thresholds]\nstrong = 0.4\nweak = nan"));
    assert!(rejected("[orb]\nscale_factor = inf"));
}
