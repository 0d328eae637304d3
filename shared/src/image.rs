use std::path::Path;

use image::imageops;
use image::io::Reader;

use crate::config::MaxDimensions;
use crate::error::ResizeError;

/// Computes the thumbnail size for a source image. Images within the cap on
/// both axes keep their natural size (thumbnails are never upscaled).
/// Otherwise a single ratio shrinks both axes, so the aspect ratio is
/// preserved and the axis with the larger relative overflow lands exactly on
/// its cap.
pub fn thumbnail_dimensions((width, height): (u32, u32), max: MaxDimensions) -> (u32, u32) {
    if width <= max.width && height <= max.height {
        return (width, height);
    }

    let ratio = f64::max(
        width as f64 / max.width as f64,
        height as f64 / max.height as f64,
    );

    (
        (width as f64 / ratio) as u32,
        (height as f64 / ratio) as u32,
    )
}

/// Decodes the downloaded artifact, shrinks it to fit `max` and writes the
/// result to `resized_path` (output format follows the path's extension).
/// Returns the output dimensions.
pub fn resize_image(
    image_path: &Path,
    resized_path: &Path,
    max: MaxDimensions,
) -> Result<(u32, u32), ResizeError> {
    let reader = Reader::open(image_path)
        .map_err(|err| ResizeError::Open {
            path: image_path.to_owned(),
            source: err,
        })?
        .with_guessed_format()
        .map_err(|err| ResizeError::Open {
            path: image_path.to_owned(),
            source: err,
        })?;

    let img = reader.decode()?;
    let natural = (img.width(), img.height());
    let (width, height) = thumbnail_dimensions(natural, max);

    let thumbnail = if (width, height) == natural {
        img
    } else {
        img.resize_exact(width, height, imageops::FilterType::Triangle)
    };

    thumbnail.save(resized_path)?;

    Ok((width, height))
}
