use std::borrow::Cow;

use arboard::{Clipboard, ImageData};
use image::{DynamicImage, RgbaImage};

use crate::error::EditorError;

/// Reads an image off the system clipboard. `Ok(None)` when the clipboard
/// holds no image (text, files, empty); that is not an error, the paste is
/// simply ignored.
pub fn read_image() -> Result<Option<DynamicImage>, EditorError> {
    let mut clipboard = Clipboard::new().map_err(|_| EditorError::ClipboardUnsupported)?;
    match clipboard.get_image() {
        Ok(data) => {
            let width = data.width as u32;
            let height = data.height as u32;
            let buffer = RgbaImage::from_raw(width, height, data.bytes.into_owned()).ok_or_else(
                || EditorError::DecodeFailure("clipboard image has an unexpected layout".into()),
            )?;
            Ok(Some(DynamicImage::ImageRgba8(buffer)))
        }
        Err(arboard::Error::ContentNotAvailable) => Ok(None),
        Err(err) => Err(EditorError::DecodeFailure(err.to_string())),
    }
}

/// Places a finished bitmap on the system clipboard.
pub fn write_image(image: &RgbaImage) -> Result<(), EditorError> {
    let mut clipboard = Clipboard::new().map_err(|_| EditorError::ClipboardUnsupported)?;
    clipboard
        .set_image(ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw()),
        })
        .map_err(|err| EditorError::ClipboardWriteFailure(err.to_string()))
}
