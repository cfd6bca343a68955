//! Reading and writing image files.

use crate::Error;
use image::{ImageError, ImageFormat, RgbImage};
use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Opens and decodes the image at `path` as 8-bit sRGB.
///
/// The format is guessed from the file contents and extension.
/// Alpha channels are dropped.
///
/// # Errors
/// Returns [`Error::ImageDecode`] if the file cannot be read or decoded.
pub fn open_image(path: impl AsRef<Path>) -> Result<RgbImage, Error> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|source| Error::ImageDecode { path: path.to_path_buf(), source })?
        .into_rgb8();

    debug!(path = %path.display(), width = image.width(), height = image.height(), "decoded image");
    Ok(image)
}

/// Encodes `image` and writes it to `path`.
///
/// The format is inferred from the extension of `path`.
/// The image is encoded in memory first, so an unsupported format or encoding failure
/// leaves the file system untouched. The bytes are then written to a temporary file
/// in the same directory and renamed onto `path`, so on failure any existing file at `path`
/// is kept as it was and no partial output is left behind.
///
/// # Errors
/// Returns [`Error::ImageWrite`] if the format is unknown or the image cannot be encoded or written.
pub fn save_image(image: &RgbImage, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let write_error = |source| Error::ImageWrite { path: path.to_path_buf(), source };

    let format = ImageFormat::from_path(path).map_err(write_error)?;

    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).map_err(write_error)?;
    let buf = buf.into_inner();

    let temp = temp_path(path);
    if let Err(err) = fs::write(&temp, &buf).and_then(|()| fs::rename(&temp, path)) {
        // only the temporary file is ours to clean up
        let _ = fs::remove_file(&temp);
        return Err(write_error(ImageError::IoError(err)));
    }

    debug!(path = %path.display(), ?format, bytes = buf.len(), "wrote image");
    Ok(())
}

/// A hidden sibling of `path` to stage the encoded bytes in.
fn temp_path(path: &Path) -> PathBuf {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}
