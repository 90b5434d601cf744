#![cfg(feature = "image-io")]

mod common;

use common::{textured_rgb, SIDE};
use prodmatch::image::io::load_image;
use prodmatch::{compare, DecodeError, FusionWeights, Image, MatchError};
use std::io::Cursor;

fn encode_png(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let img = image::RgbImage::from_raw(width as u32, height as u32, data.to_vec()).unwrap();
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn png_input_scores_like_raw_pixels() {
    let data = textured_rgb(400, SIDE, SIDE);
    let raw = Image::from_rgb("raw", data.clone(), SIDE, SIDE);
    let png = Image::from_encoded("png", encode_png(&data, SIDE, SIDE));

    let weights = FusionWeights::default();
    let from_raw = compare(&raw, &raw, &weights, false).unwrap();
    let from_png = compare(&raw, &png, &weights, false).unwrap();
    assert_eq!(from_raw.metrics, from_png.metrics);
}

#[test]
fn garbage_bytes_are_a_decode_error() {
    let good = Image::from_rgb("good", textured_rgb(401, SIDE, SIDE), SIDE, SIDE);
    let bad = Image::from_encoded("bad", vec![0x89, b'P', b'N', b'G', 1, 2, 3]);
    let err = compare(&good, &bad, &FusionWeights::default(), false).unwrap_err();
    assert!(matches!(err, MatchError::Decode(DecodeError::Malformed(_))));
}

#[test]
fn load_image_keeps_path_as_identifier() {
    let data = textured_rgb(402, 32, 32);
    let path = std::env::temp_dir().join(format!("prodmatch-load-{}.png", std::process::id()));
    std::fs::write(&path, encode_png(&data, 32, 32)).unwrap();

    let image = load_image(&path).unwrap();
    assert_eq!(image.id(), path.display().to_string());
    assert_eq!(image.decode_rgb().unwrap().data(), data.as_slice());
    std::fs::remove_file(&path).ok();

    assert!(load_image(path.with_extension("missing")).is_err());
}
