mod common;

use common::*;
use sigverify::classify;
use sigverify::config::SsimConfig;
use sigverify::scoring::{score_similarity, SimilarityScorer, SsimScorer};

#[test]
fn identical_images_score_exactly_one() -> anyhow::Result<()> {
    let scorer = SsimScorer::default();
    let img = textured_image(320, 140, 7);

    assert_eq!(scorer.score(&img, &img)?, 1.0);
    assert_eq!(scorer.score(&blank_image(500, 200), &blank_image(500, 200))?, 1.0);
    Ok(())
}

#[test]
fn score_is_symmetric() -> anyhow::Result<()> {
    let scorer = SsimScorer::default();
    let a = textured_image(500, 200, 1);
    let b = rectangle_image();

    assert_eq!(scorer.score(&a, &b)?, scorer.score(&b, &a)?);
    Ok(())
}

#[test]
fn identical_rectangles_match() -> anyhow::Result<()> {
    let scorer = SsimScorer::default();
    let score = score_similarity(&rectangle_image(), &rectangle_image(), &scorer)?;

    assert!(score >= 0.99);
    assert_eq!(classify(score, Strategy::Ssim), Verdict::Match);
    Ok(())
}

#[test]
fn white_versus_black_is_a_mismatch() -> anyhow::Result<()> {
    let scorer = SsimScorer::default();
    let score = scorer.score(&solid_gray(500, 200, 255), &solid_gray(500, 200, 0))?;

    assert!(score < 0.3, "score {score}");
    assert_eq!(classify(score, Strategy::Ssim), Verdict::Mismatch);
    Ok(())
}

#[test]
fn crops_of_different_size_are_normalized() -> anyhow::Result<()> {
    let scorer = SsimScorer::default();
    let small = blob_image(120, 60, BoundingBox { x: 30, y: 20, width: 60, height: 20 });
    let large = blob_image(480, 240, BoundingBox { x: 120, y: 80, width: 240, height: 80 });

    let score = scorer.score(&small, &large)?;
    assert!(score > 0.75, "score {score}");
    Ok(())
}

#[test]
fn shifted_mark_scores_lower_than_identical() -> anyhow::Result<()> {
    let scorer = SsimScorer::new(SsimConfig::default());
    let moved = blob_image(500, 200, BoundingBox { x: 40, y: 20, width: 80, height: 40 });

    let score = scorer.score(&rectangle_image(), &moved)?;
    assert!(score < 1.0);
    assert!((0.0..=1.0).contains(&score));
    Ok(())
}
