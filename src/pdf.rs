use crate::assets::parse_data_uri;
use crate::canvas::{Command, Document, Page};
use crate::flate::zlib_store;
use crate::types::{Color, Pt};
use fixed::types::I32F32;
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::Path;

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

/// Serialize a canvas document to PDF 1.7 bytes.
///
/// The object list is assembled in memory: catalog, page tree, shared
/// resources, fonts, image XObjects, then one page node and content stream
/// per canvas page. Output is a pure function of the document.
pub fn document_to_pdf(document: &Document) -> io::Result<Vec<u8>> {
    let mut objects: Vec<String> = Vec::new();
    objects.push(String::new()); // 1: catalog, filled below.
    objects.push(String::new()); // 2: page tree.
    objects.push(String::new()); // 3: resources.

    let mut next_id = PDF_RESOURCES_ID + 1;

    let fonts = collect_used_font_names(document);
    let mut font_resources: Vec<(String, usize)> = Vec::new();
    let mut font_map: HashMap<String, String> = HashMap::new();
    for (index, name) in fonts.iter().enumerate() {
        let resource = format!("F{}", index + 1);
        objects.push(font_object(name));
        font_resources.push((resource.clone(), next_id));
        font_map.insert(name.clone(), resource);
        next_id += 1;
    }

    let sources = collect_image_sources(document);
    let (image_objects, image_resources, image_map, next) =
        build_image_objects(&sources, next_id);
    objects.extend(image_objects);
    next_id = next;

    let mut kids: Vec<usize> = Vec::new();
    let page_height = document.page_size.height;
    for page in &document.pages {
        let content = page_to_content(page, page_height, &font_map, &image_map);
        let content_id = next_id;
        objects.push(stream_object(&content));
        next_id += 1;

        let page_id = next_id;
        objects.push(format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
            PDF_PAGES_ID,
            fmt_pt(document.page_size.width),
            fmt_pt(document.page_size.height),
            PDF_RESOURCES_ID,
            content_id
        ));
        kids.push(page_id);
        next_id += 1;
    }

    let info_id = next_id;
    objects.push("<< /Producer (cardstock) >>".to_string());

    objects[PDF_CATALOG_ID - 1] = format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID);
    let kid_refs = kids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");
    objects[PDF_PAGES_ID - 1] = format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kid_refs,
        kids.len()
    );
    objects[PDF_RESOURCES_ID - 1] = resources_object(&font_resources, &image_resources);

    Ok(build_pdf(objects, PDF_CATALOG_ID, Some(info_id)))
}

fn collect_used_font_names(document: &Document) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for page in &document.pages {
        let mut current_font = "Helvetica".to_string();
        for cmd in &page.commands {
            match cmd {
                Command::SetFontName(name) => current_font = name.clone(),
                Command::DrawString { .. } => {
                    names.insert(current_font.clone());
                }
                _ => {}
            }
        }
    }
    names
}

fn collect_image_sources(document: &Document) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut sources = Vec::new();
    for page in &document.pages {
        for cmd in &page.commands {
            if let Command::DrawImage { resource_id, .. } = cmd
                && seen.insert(resource_id.clone())
            {
                sources.push(resource_id.clone());
            }
        }
    }
    sources
}

fn font_object(name: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        name
    )
}

struct ImageData {
    width: u32,
    height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

/// Decode each distinct source once; identical pixel data shares one
/// XObject even when referenced through different paths.
fn build_image_objects(
    sources: &[String],
    start_id: usize,
) -> (
    Vec<String>,
    Vec<(String, usize)>,
    HashMap<String, String>,
    usize,
) {
    let mut objects = Vec::new();
    let mut resources = Vec::new();
    let mut name_map = HashMap::new();
    let mut content_map: HashMap<u64, String> = HashMap::new();
    let mut next_id = start_id;
    let mut image_index = 1usize;

    for source in sources {
        let Some(image) = load_image(source) else {
            continue;
        };
        let hash = hash_bytes(&image.data);
        if let Some(name) = content_map.get(&hash) {
            name_map.insert(source.clone(), name.clone());
            continue;
        }

        let smask_id = image.alpha.as_ref().map(|_| {
            let id = next_id;
            next_id += 1;
            id
        });
        let obj_id = next_id;
        next_id += 1;
        let name = format!("Im{}", image_index);
        image_index += 1;

        if let (Some(alpha), Some(mask_id)) = (image.alpha.as_ref(), smask_id) {
            objects.push(image_smask_object(image.width, image.height, alpha));
            objects.push(image_object(&image, Some(mask_id)));
        } else {
            objects.push(image_object(&image, None));
        }
        resources.push((name.clone(), obj_id));
        name_map.insert(source.clone(), name.clone());
        content_map.insert(hash, name);
    }

    (objects, resources, name_map, next_id)
}

fn load_image(source: &str) -> Option<ImageData> {
    let bytes = if let Some((_, data)) = parse_data_uri(source) {
        data
    } else {
        std::fs::read(Path::new(source)).ok()?
    };
    decode_image_bytes(&bytes)
}

fn decode_image_bytes(bytes: &[u8]) -> Option<ImageData> {
    let format = image::guess_format(bytes).ok()?;
    if format == image::ImageFormat::Jpeg {
        // JPEG passes through; PDF readers decode DCT natively.
        let decoded = image::load_from_memory_with_format(bytes, format).ok()?;
        return Some(ImageData {
            width: decoded.width(),
            height: decoded.height(),
            color_space: "/DeviceRGB",
            filter: "/DCTDecode",
            data: bytes.to_vec(),
            alpha: None,
        });
    }

    let decoded = image::load_from_memory_with_format(bytes, format).ok()?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut opaque = true;
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
        if pixel.0[3] != 0xFF {
            opaque = false;
        }
    }
    Some(ImageData {
        width,
        height,
        color_space: "/DeviceRGB",
        filter: "/FlateDecode",
        data: zlib_store(&rgb),
        alpha: if opaque { None } else { Some(zlib_store(&alpha)) },
    })
}

fn hash_bytes(data: &[u8]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

fn image_object(image: &ImageData, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let filters = match image.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "[/ASCIIHexDecode /FlateDecode]",
    };
    let smask = smask_id
        .map(|id| format!(" /SMask {} 0 R", id))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Length {} /Filter {}{} >>\nstream\n{}\nendstream",
        image.width,
        image.height,
        image.color_space,
        stream_data.len(),
        filters,
        smask,
        stream_data
    )
}

fn image_smask_object(width: u32, height: u32, alpha: &[u8]) -> String {
    let stream_data = encode_stream_data(alpha);
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Length {} /Filter [/ASCIIHexDecode /FlateDecode] >>\nstream\n{}\nendstream",
        width,
        height,
        stream_data.len(),
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = ascii_hex_encode(data);
    hex.push('>');
    hex
}

fn ascii_hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

fn resources_object(fonts: &[(String, usize)], images: &[(String, usize)]) -> String {
    let mut out = String::from("<<");
    if !fonts.is_empty() {
        out.push_str(" /Font <<");
        for (resource, id) in fonts {
            out.push_str(&format!(" /{} {} 0 R", resource, id));
        }
        out.push_str(" >>");
    }
    if !images.is_empty() {
        out.push_str(" /XObject <<");
        for (resource, id) in images {
            out.push_str(&format!(" /{} {} 0 R", resource, id));
        }
        out.push_str(" >>");
    }
    out.push_str(" >>");
    out
}

fn page_to_content(
    page: &Page,
    page_height: Pt,
    font_map: &HashMap<String, String>,
    image_map: &HashMap<String, String>,
) -> String {
    let mut out = String::new();
    let mut current_font_name = "Helvetica".to_string();
    let mut current_font_size = Pt::from_f32(12.0);

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => out.push_str("q\n"),
            Command::RestoreState => out.push_str("Q\n"),
            Command::SetFillColor(color) => out.push_str(&color_to_pdf_fill(*color)),
            Command::SetStrokeColor(color) => out.push_str(&color_to_pdf_stroke(*color)),
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetFontName(name) => {
                current_font_name = name.clone();
            }
            Command::SetFontSize(size) => {
                current_font_size = *size;
            }
            Command::MoveTo { x, y } => {
                out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::LineTo { x, y } => {
                out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::Stroke => out.push_str("S\n"),
            Command::DrawString { x, y, text } => {
                out.push_str("BT\n");
                let resource = font_map
                    .get(&current_font_name)
                    .map(String::as_str)
                    .unwrap_or("F1");
                out.push_str(&format!("/{} {} Tf\n", resource, fmt_pt(current_font_size)));
                out.push_str(&format!(
                    "{} {} Td\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - current_font_size)
                ));
                out.push_str(&format!("({}) Tj\n", encode_winansi_pdf_string(text)));
                out.push_str("ET\n");
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nf\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::StrokeRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nS\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                if let Some(name) = image_map.get(resource_id) {
                    let draw_y = page_height - *y - *height;
                    out.push_str("q\n");
                    out.push_str(&format!(
                        "{} 0 0 {} {} {} cm\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(draw_y)
                    ));
                    out.push_str(&format!("/{} Do\n", name));
                    out.push_str("Q\n");
                }
            }
        }
    }

    out
}

fn stream_object(content: &str) -> String {
    let length = content.len();
    format!("<< /Length {} >>\nstream\n{}\nendstream", length, content)
}

fn build_pdf(objects: Vec<String>, catalog_id: usize, info_id: Option<usize>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::new();
    for (index, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        let obj_id = index + 1;
        out.extend_from_slice(format!("{} 0 obj\n", obj_id).as_bytes());
        out.extend_from_slice(obj.as_bytes());
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }

    let mut trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R",
        objects.len() + 1,
        catalog_id
    );
    if let Some(info_id) = info_id {
        trailer.push_str(&format!(" /Info {} 0 R", info_id));
    }
    trailer.push_str(&format!(" >>\nstartxref\n{}\n%%EOF", xref_start));
    out.extend_from_slice(trailer.as_bytes());

    out
}

fn encode_winansi_pdf_string(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            // Common cp1252 extensions.
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        };

        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }
    out
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = I32F32::from_num(value);
    let scaled = (fixed * I32F32::from_num(1000)).round();
    let milli: i64 = scaled.to_num();
    format_milli(milli)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

fn color_to_pdf_fill(color: Color) -> String {
    format!("{} {} {} rg\n", fmt(color.r), fmt(color.g), fmt(color.b))
}

fn color_to_pdf_stroke(color: Color) -> String {
    format!("{} {} {} RG\n", fmt(color.r), fmt(color.g), fmt(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::types::Size;

    #[test]
    fn fmt_trims_trailing_zeros() {
        assert_eq!(fmt_pt(Pt::from_f32(271.0)), "271");
        assert_eq!(fmt_pt(Pt::from_f32(195.133)), "195.133");
        assert_eq!(fmt_pt(Pt::from_f32(0.5)), "0.5");
        assert_eq!(fmt_pt(Pt::from_f32(-4.25)), "-4.25");
        assert_eq!(fmt_pt(Pt::ZERO), "0");
    }

    #[test]
    fn winansi_escapes_delimiters_and_replaces_unmapped() {
        assert_eq!(encode_winansi_pdf_string("a(b)c"), "a\\(b\\)c");
        assert_eq!(encode_winansi_pdf_string("dash \u{2013}"), "dash \\226");
        assert_eq!(encode_winansi_pdf_string("\u{20B9}100"), "?100");
    }

    #[test]
    fn content_stream_flips_vertical_axis() {
        let mut font_map = HashMap::new();
        font_map.insert("Helvetica".to_string(), "F1".to_string());
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_rect(
            Pt::from_f32(10.0),
            Pt::from_f32(20.0),
            Pt::from_f32(100.0),
            Pt::from_f32(50.0),
        );
        let doc = canvas.finish();
        let content = page_to_content(
            &doc.pages[0],
            doc.page_size.height,
            &font_map,
            &HashMap::new(),
        );
        // 841.89 - 20 - 50 = 771.89
        assert!(content.contains("10 771.89 100 50 re"));
    }

    #[test]
    fn text_uses_registered_font_resource() {
        let mut font_map = HashMap::new();
        font_map.insert("Helvetica-Bold".to_string(), "F2".to_string());
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font_name("Helvetica-Bold");
        canvas.set_font_size(Pt::from_f32(8.5));
        canvas.draw_string(Pt::from_f32(30.0), Pt::from_f32(40.0), "AREA");
        let doc = canvas.finish();
        let content = page_to_content(
            &doc.pages[0],
            doc.page_size.height,
            &font_map,
            &HashMap::new(),
        );
        assert!(content.contains("/F2 8.5 Tf"));
        assert!(content.contains("(AREA) Tj"));
    }

    #[test]
    fn pdf_bytes_have_header_and_trailer() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_string(Pt::from_f32(10.0), Pt::from_f32(10.0), "hello");
        let doc = canvas.finish();
        let bytes = document_to_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let tail = String::from_utf8_lossy(&bytes[bytes.len() - 200..]).into_owned();
        assert!(tail.contains("startxref"));
        assert!(tail.contains("%%EOF"));
    }

    #[test]
    fn distinct_sources_with_identical_bytes_share_one_xobject() {
        let dir = std::env::temp_dir();
        let a = dir.join(format!("cardstock_pdf_a_{}.png", std::process::id()));
        let b = dir.join(format!("cardstock_pdf_b_{}.png", std::process::id()));
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([7, 8, 9]));
        img.save(&a).unwrap();
        img.save(&b).unwrap();

        let sources = vec![
            a.to_string_lossy().into_owned(),
            b.to_string_lossy().into_owned(),
        ];
        let (objects, resources, name_map, _) = build_image_objects(&sources, 10);
        std::fs::remove_file(&a).ok();
        std::fs::remove_file(&b).ok();

        assert_eq!(objects.len(), 1);
        assert_eq!(resources.len(), 1);
        assert_eq!(name_map.len(), 2);
        assert_eq!(name_map[&sources[0]], name_map[&sources[1]]);
    }

    #[test]
    fn unreadable_image_source_is_dropped_not_fatal() {
        let sources = vec!["/no/such/image.png".to_string()];
        let (objects, resources, name_map, next) = build_image_objects(&sources, 10);
        assert!(objects.is_empty());
        assert!(resources.is_empty());
        assert!(name_map.is_empty());
        assert_eq!(next, 10);
    }
}
