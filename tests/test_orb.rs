mod common;

use common::*;
use sigverify::config::OrbConfig;
use sigverify::scoring::{OrbScorer, SimilarityScorer};

#[test]
fn blank_images_score_zero() -> anyhow::Result<()> {
    let scorer = OrbScorer::default();

    assert_eq!(scorer.score(&blank_image(500, 200), &blank_image(500, 200))?, 0.0);
    assert_eq!(scorer.score(&blank_image(500, 200), &textured_image(500, 200, 3))?, 0.0);
    Ok(())
}

#[test]
fn identical_textures_match_strongly() -> anyhow::Result<()> {
    let scorer = OrbScorer::default();
    let img = textured_image(500, 200, 11);

    let score = scorer.score(&img, &img)?;
    assert!(score > 0.5, "score {score}");
    assert!(score <= 1.0);
    Ok(())
}

#[test]
fn score_stays_in_unit_range() -> anyhow::Result<()> {
    let scorer = OrbScorer::default();
    let a = textured_image(500, 200, 5);
    let b = textured_image(300, 300, 6);

    let score = scorer.score(&a, &b)?;
    assert!((0.0..=1.0).contains(&score), "score {score}");
    Ok(())
}

#[test]
fn feature_count_is_capped() {
    let config = OrbConfig {
        max_features: 40,
        ..OrbConfig::default()
    };
    let scorer = OrbScorer::new(config);
    let gray = textured_image(500, 200, 9).to_luma8();

    let (keypoints, descriptors) = scorer.detect_and_describe(&gray);
    assert!(!keypoints.is_empty());
    assert!(keypoints.len() <= 40);
    assert_eq!(keypoints.len(), descriptors.len());
    assert!(keypoints.windows(2).all(|w| w[0].response >= w[1].response));
}

#[test]
fn tiny_images_have_no_features() {
    let scorer = OrbScorer::default();
    let gray = textured_image(20, 20, 2).to_luma8();

    let (keypoints, descriptors) = scorer.detect_and_describe(&gray);
    assert!(keypoints.is_empty());
    assert!(descriptors.is_empty());
}
