//! Overlap masks for a row of rectilinear shots.
//!
//! Usage:
//! ```text
//! cargo run --example overlap                 # three shots, 40 degrees apart
//! cargo run --example overlap -- 25           # custom yaw step
//! RUST_LOG=overmask=debug cargo run --example overlap
//! ```

use overmask::operations::{BatchAnalysis, MaskOutcome, MaskParams, PairParams};
use overmask::transform::{RectilinearTransform, SourceImage};
use overmask::Result;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 900;
const HFOV: f64 = 60.0;

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for overmask.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("overlap=info".parse().unwrap_or_default())
        .add_directive("overmask=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let step: f64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(40.0);

    let images: Vec<SourceImage<RectilinearTransform>> = (0..3)
        .map(|i| {
            let yaw = step * f64::from(i);
            let pitch = if i == 1 { 5.0 } else { 0.0 };
            SourceImage::new(
                WIDTH,
                HEIGHT,
                RectilinearTransform::new(WIDTH, HFOV, yaw, pitch, 0.0),
            )
        })
        .collect();

    let params = MaskParams::default().with_stride(50.0);
    let report = BatchAnalysis::new(&images)
        .with_mask_params(params)
        .with_pair_params(PairParams::default())
        .execute()?;

    for pair in &report.pairs {
        println!(
            "pair ({}, {}): ratios {:.4} / {:.4}, qualifies: {}",
            pair.first,
            pair.second,
            pair.overlap.first_ratio(),
            pair.overlap.second_ratio(),
            pair.qualifies
        );
        let Some(overlap) = &pair.overlap.first else {
            continue;
        };
        println!(
            "  center ({:.1}, {:.1}), rotate: {}",
            overlap.center.x, overlap.center.y, overlap.rotate_overlap_pano
        );
        if let Some(rotation) = overlap.alignment(&images[pair.first].transform) {
            println!(
                "  pano rotation: yaw {:.2}, pitch {:.2}, roll {:.0}",
                rotation.yaw, rotation.pitch, rotation.roll
            );
        }
        for mask in &overlap.include_masks {
            println!("  include mask, {} points:", mask.len());
            for p in mask.to_pixel(WIDTH, HEIGHT) {
                println!("    {:8.2} {:8.2}", p.x, p.y);
            }
        }
        for mask in &overlap.exclude_masks {
            println!("  exclude mask, {} points", mask.len());
        }
    }
    for failure in &report.failures {
        println!("{failure}");
    }

    let single = overmask::operations::MaskNonoverlaps::new(&images[0], &images[0]).execute()?;
    if let MaskOutcome::Coincident(overlap) = single {
        println!("image 0 with itself: ratio {:.4}", overlap.ratio);
    }
    Ok(())
}
