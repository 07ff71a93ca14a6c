mod common;

use ndarray::{Array, Array5, Axis, concatenate};
use slitcube::fits::{Header, read_fits, write_fits};
use slitcube::{AssembleOptions, SlitAssembler, SplitOutcome, split_time_series};
use tempfile::TempDir;

use common::{ROWS, write_dataset};

fn stacked_cube() -> Array5<f64> {
    Array::from_shape_fn((4, 112, 5, 7, 3), |(p, w, y, s, t)| {
        (p * 1_000_000 + w * 10_000 + y * 1_000 + s * 10 + t) as f64
    })
}

#[tokio::test]
async fn every_scan_becomes_a_file() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("a.stacked.20230615120000.fits");
    let cube = stacked_cube();
    write_fits(&source, &Header::new(), &cube.view().into_dyn())
        .await
        .unwrap();

    let outcome = split_time_series(&source, tmp.path(), None).await.unwrap();

    let directory = tmp.path().join("a.stacked.20230615120000_unstacked");
    assert_eq!(
        outcome,
        SplitOutcome::Split {
            directory: directory.clone(),
            segments: 3
        }
    );
    for t in 0..3 {
        let image = read_fits(&directory.join(format!("stack_{t}.fits")))
            .await
            .unwrap();
        assert_eq!(image.data.shape(), &[4, 112, 5, 7]);
        assert_eq!(image.data, cube.index_axis(Axis(4), t).into_dyn());
    }
    assert!(!directory.join("stack_3.fits").exists());
}

#[tokio::test]
async fn limit_caps_the_number_of_scans() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("cube.fits");
    write_fits(&source, &Header::new(), &stacked_cube().view().into_dyn())
        .await
        .unwrap();

    let outcome = split_time_series(&source, tmp.path(), Some(2)).await.unwrap();
    assert_eq!(outcome.segments(), 2);
    assert!(!tmp.path().join("cube_unstacked/stack_2.fits").exists());

    // Running again into the existing directory is fine; the cap is clamped.
    let outcome = split_time_series(&source, tmp.path(), Some(10)).await.unwrap();
    assert_eq!(outcome.segments(), 3);
}

#[tokio::test]
async fn missing_source_is_reported_not_raised() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("absent.fits");

    let outcome = split_time_series(&source, tmp.path(), None).await.unwrap();

    assert_eq!(outcome, SplitOutcome::SourceMissing(source));
    assert_eq!(outcome.segments(), 0);
    assert!(!tmp.path().join("absent_unstacked").exists());
}

#[tokio::test]
async fn unstacked_cube_is_a_format_mismatch() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("raster.fits");
    let raster = Array::<f64, _>::zeros((4, 112, 5, 3));
    write_fits(&source, &Header::new(), &raster.view().into_dyn())
        .await
        .unwrap();

    let err = split_time_series(&source, tmp.path(), None).await.unwrap_err();

    assert!(err.is_format_mismatch(), "{err}");
}

#[tokio::test]
async fn assemble_then_unstack_reconstructs_the_raster() {
    let tmp = TempDir::new().unwrap();
    let dataset = tmp.path().join("20230615120000");
    write_dataset(&dataset, 21, ROWS);

    let raster_options = AssembleOptions {
        steps: None,
        correct: false,
        normalize: false,
        spectral_cutoff: 112,
    };
    let raster = SlitAssembler::new(raster_options)
        .assemble(&dataset, tmp.path(), "x.fits")
        .await
        .unwrap();
    let stacked = SlitAssembler::new(AssembleOptions {
        steps: Some(7),
        ..raster_options
    })
    .assemble(&dataset, tmp.path(), "x.fits")
    .await
    .unwrap();
    assert_eq!(stacked.shape, vec![4, 112, ROWS, 7, 3]);

    let outcome = split_time_series(&stacked.path, tmp.path(), None).await.unwrap();
    let SplitOutcome::Split { directory, segments } = outcome else {
        panic!("stacked cube should exist");
    };
    assert_eq!(segments, 3);

    let mut parts = Vec::new();
    for t in 0..segments {
        parts.push(read_fits(&directory.join(format!("stack_{t}.fits"))).await.unwrap().data);
    }
    let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
    let rebuilt = concatenate(Axis(3), &views).unwrap();

    assert_eq!(rebuilt, read_fits(&raster.path).await.unwrap().data);
}
