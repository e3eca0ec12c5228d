use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use base64::Engine;
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::geometry::ModuleGeometry;
use crate::style::is_dark_module;

/*---- Utilities ----*/

/// Identifies an exported image: a timestamp for static codes, the short
/// code for dynamic ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportName {
    Timestamp(i64),
    ShortCode(String),
}

impl ExportName {
    /// A timestamp name for the current time, in milliseconds since the epoch.
    pub fn now() -> Self {
        ExportName::Timestamp(Utc::now().timestamp_millis())
    }

    /// The file name, `qrcode-{identifier}.png`.
    pub fn file_name(&self) -> String {
        match self {
            ExportName::Timestamp(millis) => format!("qrcode-{millis}.png"),
            ExportName::ShortCode(code) => format!("qrcode-{code}.png"),
        }
    }
}

/// Encodes a canvas as PNG bytes.
///
/// # Errors
///
/// Returns an `image::ImageError` if PNG encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Wraps PNG bytes in a `data:` URL, as browsers expect for downloads.
pub fn to_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Writes PNG bytes to `directory/qrcode-{identifier}.png`.
///
/// # Arguments
///
/// * `png` - The encoded image.
/// * `directory_path` - Optional. The directory path where the image will be saved.
///   If not provided, the default directory is "generated".
/// * `name` - The identifier used in the file name.
///
/// # Errors
///
/// Returns an `image::ImageError` if the directory cannot be created or the file cannot be written.
///
/// # Example
///
/// ```rust,no_run
/// use qrcanvas::helper::{save_png, ExportName};
///
/// let path = save_png(&[], Some("images"), &ExportName::ShortCode("aZ3kQ9".into())).unwrap();
/// assert!(path.ends_with("qrcode-aZ3kQ9.png"));
/// ```
pub fn save_png(
    png: &[u8],
    directory_path: Option<&str>,
    name: &ExportName,
) -> Result<PathBuf, image::ImageError> {
    let directory_path = directory_path.unwrap_or("generated");

    // Check if the directory exists, create it if it doesn't
    if !Path::new(directory_path).exists() {
        fs::create_dir_all(directory_path)?;
    }

    let file_path = Path::new(directory_path).join(name.file_name());
    fs::write(&file_path, png)?;
    Ok(file_path)
}

/// Renders the module grid of a raster as text, two characters per module.
pub fn module_grid_string(image: &RgbaImage, geometry: &ModuleGeometry) -> String {
    let border = 2;
    let size = geometry.dimension as i64;
    let mut result = String::new();
    for row in -border..size + border {
        for col in -border..size + border {
            let inside = (0..size).contains(&row) && (0..size).contains(&col);
            let dark = inside && is_dark_module(image, geometry, row as u32, col as u32);
            let c: char = if dark { '█' } else { ' ' };
            result.push(c);
            result.push(c);
        }
        result.push('\n');
    }
    result
}

/// Prints the module grid of a raster to the console.
pub fn print_modules(image: &RgbaImage, geometry: &ModuleGeometry) {
    println!("{}", module_grid_string(image, geometry));
}
