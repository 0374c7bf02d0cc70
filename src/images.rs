use crate::error::CardstockError;
use std::path::{Path, PathBuf};

/// One pre-rendered card image found in the source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub path: PathBuf,
}

/// Collect decodable images from `dir`, non-recursive, sorted by path so the
/// sheet order is stable across runs. Files the decoder rejects are not
/// items and are silently left out, as are subdirectories.
pub fn scan_image_folder(dir: impl AsRef<Path>) -> Result<Vec<ImageItem>, CardstockError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(CardstockError::Ingest(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut items = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        // Header probe only; full decode happens at render time.
        if image::image_dimensions(&path).is_ok() {
            items.push(ImageItem { path });
        }
    }
    items.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn temp_folder(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cardstock_images_{}_{}",
            tag,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn scan_keeps_only_decodable_files_in_name_order() {
        let dir = temp_folder("scan");
        write_png(&dir, "b.png", 4, 4);
        write_png(&dir, "a.png", 4, 4);
        std::fs::write(dir.join("notes.txt"), b"not an image").unwrap();
        std::fs::create_dir_all(dir.join("nested")).unwrap();

        let items = scan_image_folder(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        let names: Vec<String> = items
            .iter()
            .map(|item| {
                item.path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn missing_folder_is_an_ingest_error() {
        let err = scan_image_folder("/no/such/folder").unwrap_err();
        assert!(matches!(err, CardstockError::Ingest(_)));
    }
}
