use base64::Engine;
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

const LOGO_SIZE: u32 = 300;
const LOGO_GOLD: Rgba<u8> = Rgba([192, 155, 85, 255]);
const LOGO_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Resolve the card logo to an image resource id the renderer can draw:
/// a readable file path stays a path, anything else falls back to the
/// built-in synthesized logo (as a PNG data URI).
pub(crate) fn resolve_logo(custom: Option<&Path>) -> String {
    if let Some(path) = custom
        && path.is_file()
        && let Some(text) = path.to_str()
    {
        return text.to_string();
    }
    synthesized_logo()
}

/// Golden disc with a simplified seated silhouette, 300x300. Stands in when
/// no logo file is supplied, matching the sheet format's stock artwork.
pub(crate) fn synthesized_logo() -> String {
    let mut img = RgbaImage::from_pixel(LOGO_SIZE, LOGO_SIZE, Rgba([0, 0, 0, 0]));
    fill_ellipse(&mut img, 150.0, 150.0, 150.0, 150.0, LOGO_GOLD);
    // Head.
    fill_ellipse(&mut img, 150.0, 85.0, 25.0, 25.0, LOGO_WHITE);
    // Torso.
    fill_rect(&mut img, 135, 110, 165, 180, LOGO_WHITE);
    // Folded legs.
    fill_ellipse(&mut img, 150.0, 200.0, 40.0, 20.0, LOGO_WHITE);

    let mut png: Vec<u8> = Vec::new();
    let encode = image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png);
    debug_assert!(encode.is_ok());
    png_data_uri(&png)
}

fn fill_ellipse(img: &mut RgbaImage, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        for x in 0..w {
            let dx = (x as f32 + 0.5 - cx) / rx;
            let dy = (y as f32 + 0.5 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 {
                img.put_pixel(x, y, color);
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    for y in y0..y1.min(h) {
        for x in x0..x1.min(w) {
            img.put_pixel(x, y, color);
        }
    }
}

pub(crate) fn png_data_uri(png: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    format!("data:image/png;base64,{}", encoded)
}

/// Split a data URI into (mime, bytes). Base64 and percent-plain payloads
/// are both accepted.
pub(crate) fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let data = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((mime.to_string(), data))
}
