#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use ndarray::{Array, Array3};
use slitcube::fits::{Card, Header, encode};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

pub const ROWS: usize = 5;

/// Positive, position-dependent values for exposure `k`.
pub fn exposure(k: usize, rows: usize) -> Array3<f64> {
    Array::from_shape_fn((4, rows, 112), |(p, y, w)| {
        1000.0 + (k * 10_000 + p * 1_000 + y * 100 + w) as f64
    })
}

pub fn exposure_header(k: usize) -> Header {
    let mut header = Header::new();
    header.push(Card::integer("SLITINDX", k as i64, "scan position"));
    header.push(Card::integer("BZERO", 0, ""));
    header
}

pub fn exposure_bytes(k: usize, data: &Array3<f64>) -> Vec<u8> {
    encode(&exposure_header(k), &data.view().into_dyn())
}

pub fn write_exposure(dir: &Path, name: &str, k: usize, data: &Array3<f64>) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), exposure_bytes(k, data)).unwrap();
}

/// Write `count` exposures named `slit_000.fits`, `slit_001.fits`, ...
pub fn write_dataset(dir: &Path, count: usize, rows: usize) -> Vec<Array3<f64>> {
    (0..count)
        .map(|k| {
            let data = exposure(k, rows);
            write_exposure(dir, &format!("slit_{k:03}.fits"), k, &data);
            data
        })
        .collect()
}

/// Build a ZIP at `path` from `(name, contents)` pairs; names ending in `/`
/// become directory entries. Every other member alternates STORED/DEFLATE.
pub fn write_zip(path: &Path, members: &[(String, Vec<u8>)]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);

    for (i, (name, contents)) in members.iter().enumerate() {
        if name.ends_with('/') {
            zip.add_directory(name.as_str(), SimpleFileOptions::default())
                .unwrap();
            continue;
        }
        let method = if i % 2 == 0 {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        zip.start_file(
            name.as_str(),
            SimpleFileOptions::default().compression_method(method),
        )
        .unwrap();
        zip.write_all(contents).unwrap();
    }

    zip.finish().unwrap();
}

/// Archive laid out like an instrument bundle: one container with a dataset
/// of `count` exposures and a directory that is not a dataset.
pub fn observation_archive(path: &Path, dataset: &str, count: usize) -> Vec<Array3<f64>> {
    let mut members = vec![
        ("hinode/".to_string(), Vec::new()),
        ("hinode/SP3D/".to_string(), Vec::new()),
        (format!("hinode/SP3D/{dataset}/"), Vec::new()),
        ("hinode/SP3D/notadate/".to_string(), Vec::new()),
        ("hinode/SP3D/notadate/readme.txt".to_string(), b"calibration notes".to_vec()),
    ];
    let exposures: Vec<_> = (0..count).map(|k| exposure(k, ROWS)).collect();
    for (k, data) in exposures.iter().enumerate() {
        members.push((
            format!("hinode/SP3D/{dataset}/slit_{k:03}.fits"),
            exposure_bytes(k, data),
        ));
    }
    write_zip(path, &members);
    exposures
}
