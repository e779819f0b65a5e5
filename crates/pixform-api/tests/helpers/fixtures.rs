//! Test fixtures: encoded images and multipart parts.

use axum_test::multipart::Part;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Gradient JPEG of the given size
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// Semi-transparent PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 128]));
    encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

pub fn jpeg_part(width: u32, height: u32) -> Part {
    Part::bytes(jpeg_bytes(width, height))
        .file_name("photo.jpg")
        .mime_type("image/jpeg")
}

pub fn png_part(width: u32, height: u32) -> Part {
    Part::bytes(png_bytes(width, height))
        .file_name("logo.png")
        .mime_type("image/png")
}

/// Decode a response body
pub fn decode(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}

pub fn detect(bytes: &[u8]) -> ImageFormat {
    image::guess_format(bytes).unwrap()
}
