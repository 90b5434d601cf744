#![allow(dead_code)]

use image::imageops::{self, FilterType};
use image::RgbImage;
use prodmatch::Image;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Working resolution used by the default engine; images of this size are
/// not resampled.
pub const SIDE: usize = 256;

/// Blocky colour texture with fine grain, the kind of content the keypoint
/// and template scorers lock on to.
pub fn textured_rgb(seed: u64, width: usize, height: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let cell = 8;
    let cw = width / cell + 1;
    let ch = height / cell + 1;
    let cells: Vec<[u8; 3]> = (0..cw * ch)
        .map(|_| {
            [
                rng.random_range(0..=255),
                rng.random_range(0..=255),
                rng.random_range(0..=255),
            ]
        })
        .collect();

    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let base = cells[(y / cell) * cw + x / cell];
            for c in base {
                let v = i32::from(c) + rng.random_range(-20..=20);
                data.push(v.clamp(0, 255) as u8);
            }
        }
    }
    data
}

pub fn textured(id: &str, seed: u64) -> Image {
    Image::from_rgb(id, textured_rgb(seed, SIDE, SIDE), SIDE, SIDE)
}

/// Swaps the four quadrants diagonally: every local patch survives but no
/// single planar transform explains their new positions.
pub fn quadrant_swap(data: &[u8], side: usize) -> Vec<u8> {
    let half = side / 2;
    let mut out = vec![0u8; data.len()];
    for y in 0..side {
        for x in 0..side {
            let sx = (x + half) % side;
            let sy = (y + half) % side;
            let dst = (y * side + x) * 3;
            let src = (sy * side + sx) * 3;
            out[dst..dst + 3].copy_from_slice(&data[src..src + 3]);
        }
    }
    out
}

/// Adds a constant offset to every channel.
pub fn brightened(data: &[u8], delta: i16) -> Vec<u8> {
    data.iter()
        .map(|&v| (i16::from(v) + delta).clamp(0, 255) as u8)
        .collect()
}

/// Keeps the central `keep` fraction of a square RGB frame and enlarges it
/// back to `side x side`, like a tighter shot of the same item.
pub fn center_zoom(data: &[u8], side: usize, keep: f32) -> Vec<u8> {
    let side = side as u32;
    let inner = (side as f32 * keep).round() as u32;
    let offset = (side - inner) / 2;
    let frame = RgbImage::from_raw(side, side, data.to_vec()).expect("square rgb frame");
    let crop = imageops::crop_imm(&frame, offset, offset, inner, inner).to_image();
    imageops::resize(&crop, side, side, FilterType::Triangle).into_raw()
}

/// Single-channel copy of an RGB frame (the red channel).
pub fn red_channel(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(3).map(|px| px[0]).collect()
}
