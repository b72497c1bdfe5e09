mod common;

use common::*;
use sigverify::decode_image;
use sigverify::scoring::{OrbScorer, SimilarityScorer};
use std::sync::Arc;

#[test]
fn identical_uploads_match() -> anyhow::Result<()> {
    let verifier = Verifier::new(VerifierConfig::default())?;
    let bytes = png_bytes(&rectangle_image());

    let comparison = verifier.verify_bytes(&bytes, &bytes)?;

    assert_eq!(comparison.strategy, Strategy::Ssim);
    assert_eq!(comparison.score, 1.0);
    assert_eq!(comparison.score_percent, 100.0);
    assert_eq!(comparison.verdict, Verdict::Match);
    assert_eq!(comparison.label, "Match");
    assert!(!comparison.reference.fallback);
    assert_eq!(comparison.reference.region, comparison.sample.region);
    Ok(())
}

#[test]
fn different_marks_score_lower() -> anyhow::Result<()> {
    let verifier = Verifier::new(VerifierConfig::default())?;
    let reference = png_bytes(&rectangle_image());
    let sample = png_bytes(&textured_image(500, 200, 4));

    let comparison = verifier.verify_bytes(&reference, &sample)?;

    assert!(comparison.score < 1.0);
    assert!(comparison.verdict < Verdict::Match);
    Ok(())
}

#[test]
fn corrupt_upload_is_a_client_error() -> anyhow::Result<()> {
    let verifier = Verifier::new(VerifierConfig::default())?;
    let good = png_bytes(&rectangle_image());

    let err = verifier.verify_bytes(&good, b"definitely not an image").unwrap_err();

    assert!(err.is_client_error());
    match err {
        SignatureError::Decode { input, .. } => assert_eq!(input, "sample"),
        other => panic!("expected a decode error, got {other}"),
    }
    Ok(())
}

#[test]
fn truncated_png_is_rejected() {
    let bytes = png_bytes(&rectangle_image());
    let err = decode_image(&bytes[..bytes.len() / 2], "reference").unwrap_err();
    assert!(matches!(err, SignatureError::Decode { .. }));
}

#[test]
fn blank_upload_without_fallback_is_rejected() -> anyhow::Result<()> {
    let mut config = VerifierConfig::default();
    config.extraction.fallback_to_search_region = false;
    let verifier = Verifier::new(config)?;

    let err = verifier
        .verify_bytes(&png_bytes(&rectangle_image()), &png_bytes(&blank_image(500, 200)))
        .unwrap_err();

    assert!(matches!(err, SignatureError::NoSignatureDetected { ref input } if input == "sample"));
    Ok(())
}

#[test]
fn fallback_is_reported() -> anyhow::Result<()> {
    let verifier = Verifier::new(VerifierConfig::default())?;
    let blank = png_bytes(&blank_image(500, 200));

    let comparison = verifier.verify_bytes(&png_bytes(&rectangle_image()), &blank)?;

    assert!(!comparison.reference.fallback);
    assert!(comparison.sample.fallback);
    Ok(())
}

#[test]
fn orb_strategy_uses_orb_labels() -> anyhow::Result<()> {
    let config = VerifierConfig {
        strategy: Strategy::Orb,
        ..VerifierConfig::default()
    };
    let verifier = Verifier::new(config)?;
    let blank = png_bytes(&blank_image(500, 200));

    let comparison = verifier.verify_bytes(&blank, &blank)?;

    assert_eq!(comparison.score, 0.0);
    assert_eq!(comparison.label, "Clearly Different");
    Ok(())
}

#[test]
fn injected_scorer_is_classified_with_its_own_thresholds() -> anyhow::Result<()> {
    let scorer: Arc<dyn SimilarityScorer> = Arc::new(OrbScorer::default());
    let verifier = Verifier::with_scorer(VerifierConfig::default(), scorer);
    let img = textured_image(500, 200, 8);

    let comparison = verifier.verify_images(&img, &img)?;

    assert_eq!(comparison.strategy, Strategy::Orb);
    assert_eq!(comparison.label, comparison.verdict.label(Strategy::Orb));
    Ok(())
}

#[test]
fn comparison_serializes_to_json() -> anyhow::Result<()> {
    let verifier = Verifier::new(VerifierConfig::default())?;
    let bytes = png_bytes(&rectangle_image());

    let comparison = verifier.verify_bytes(&bytes, &bytes)?;
    let json: serde_json::Value = serde_json::to_value(&comparison)?;

    assert_eq!(json["strategy"], "ssim");
    assert_eq!(json["verdict"], "match");
    assert_eq!(json["label"], "Match");
    assert!(json["reference"]["region"]["width"].as_u64().is_some());
    assert_eq!(json["sample"]["fallback"], false);
    Ok(())
}

#[test]
fn debug_dir_receives_both_inputs() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let verifier = Verifier::new(VerifierConfig::default())?.with_debug_dir(dir.path().to_path_buf())?;
    let bytes = png_bytes(&rectangle_image());

    verifier.verify_bytes(&bytes, &bytes)?;

    assert!(dir.path().join("reference/00_input/01.png").exists());
    assert!(dir.path().join("sample/06_region_merge/01.png").exists());
    Ok(())
}

#[test]
fn debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::create_dir(dir.path().join("old"))?;

    let result = Verifier::new(VerifierConfig::default())?.with_debug_dir(dir.path().to_path_buf());

    assert!(matches!(result, Err(SignatureError::Io(_))));
    Ok(())
}
