use super::types::FileType;
use std::path::Path;

pub fn reader_from_filetype(path: &Path) -> FileType {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("tif") | Some("tiff") => FileType::GeoTiff,
        _ => FileType::Gdal,
    }
}
