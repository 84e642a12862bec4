use std::fs;
use std::path::Path;

use crate::{
    error::{ParcelError, Result},
    label::ImageId,
};

pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Image files directly inside `dir`, sorted by path
pub fn scan_images(dir: &Path) -> Result<Vec<ImageId>> {
    if !dir.is_dir() {
        return Err(ParcelError::FolderNotFound(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_image_file(&path) {
            images.push(ImageId::from(path.as_path()));
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["b_x_2.JPG", "a_x_1.png", "notes.txt", "revision_20240101_000000.csv", "c_x_3.jpeg"] {
            fs::write(dir.path().join(name), b"").expect("write");
        }
        fs::create_dir(dir.path().join("nested.png")).expect("mkdir");

        let images = scan_images(dir.path()).expect("scan");
        let names: Vec<&str> = images.iter().map(|id| id.file_name()).collect();
        assert_eq!(names, vec!["a_x_1.png", "b_x_2.JPG", "c_x_3.jpeg"]);
    }

    #[test]
    fn test_missing_folder_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(matches!(scan_images(&missing), Err(ParcelError::FolderNotFound(_))));
    }
}
