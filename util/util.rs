#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// Set to a directory of images to benchmark on real photos instead of synthetic images.
pub const IMAGE_DIR_VAR: &str = "KPALETTE_BENCH_IMAGES";

pub fn load_images(images: &[PathBuf]) -> Vec<(String, RgbImage)> {
    images
        .iter()
        .map(|path| {
            kpalette::open_image(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    image,
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, RgbImage)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

/// A smooth two dimensional gradient with some per pixel noise,
/// so that there are many but not only unique colors.
pub fn synthetic_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) * 127 / (width + height).max(1)) as u8;
        let noise: u8 = rng.gen_range(0..8);
        Rgb([r.saturating_add(noise), g.saturating_add(noise), b ^ (noise & 3)])
    })
}

pub fn synthetic_images() -> Vec<(String, RgbImage)> {
    [(480, 270), (960, 540), (1920, 1080)]
        .into_iter()
        .enumerate()
        .map(|(seed, (w, h))| (format!("synthetic_{w}x{h}"), synthetic_image(w, h, seed as u64)))
        .collect()
}

static BENCH_IMAGES: OnceLock<Vec<(String, RgbImage)>> = OnceLock::new();

pub fn bench_images() -> &'static [(String, RgbImage)] {
    BENCH_IMAGES.get_or_init(|| match std::env::var_os(IMAGE_DIR_VAR) {
        Some(dir) => load_image_dir(dir),
        None => synthetic_images(),
    })
}
