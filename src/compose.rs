use image::RgbaImage;
use tiny_skia::Pixmap;

use crate::error::EditorError;

/// Composites two finalized surface buffers side by side: output width is
/// the sum of the input widths, output height the max of the input heights,
/// left at the origin, right starting at `width(left)`. No scaling, no gap,
/// no background fill beyond what each buffer already holds.
///
/// The only failure mode is `RenderContextUnavailable`, when the output
/// render target cannot be allocated.
pub fn merge(left: &RgbaImage, right: &RgbaImage) -> Result<RgbaImage, EditorError> {
    let width = left
        .width()
        .checked_add(right.width())
        .ok_or(EditorError::RenderContextUnavailable)?;
    let height = left.height().max(right.height());

    let mut target =
        Pixmap::new(width, height).ok_or(EditorError::RenderContextUnavailable)?;

    blit(&mut target, left, 0);
    blit(&mut target, right, left.width());

    RgbaImage::from_raw(width, height, target.take())
        .ok_or(EditorError::RenderContextUnavailable)
}

fn blit(target: &mut Pixmap, source: &RgbaImage, dest_x: u32) {
    let target_width = target.width() as usize;
    let data = target.data_mut();
    for (row_index, row) in source.rows().enumerate() {
        let start = (row_index * target_width + dest_x as usize) * 4;
        for (i, pixel) in row.enumerate() {
            let offset = start + i * 4;
            data[offset..offset + 4].copy_from_slice(&pixel.0);
        }
    }
}
