//! Tag and cover art writes
//!
//! Cover art is decoded, bounded in size and re-encoded as JPEG before being
//! embedded, so oversized album images don't bloat every track.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::spotify::models::TrackDescriptor;

/// Maximum dimension for embedded cover art (width or height)
const MAX_COVER_SIZE: u32 = 500;

/// Initial JPEG quality (0-100)
const JPEG_QUALITY: u8 = 85;

/// Maximum embedded cover size in bytes (300KB)
const MAX_COVER_BYTES: usize = 300 * 1024;

/// Writes metadata tags and artwork to a finished audio file.
pub trait Tagger: Send + Sync {
    fn write_tags(
        &self,
        path: &Path,
        descriptor: &TrackDescriptor,
        artwork: Option<&[u8]>,
    ) -> Result<()>;
}

/// lofty-backed tagger; handles MP4/M4A and the other common containers.
pub struct LoftyTagger;

impl Tagger for LoftyTagger {
    fn write_tags(
        &self,
        path: &Path,
        descriptor: &TrackDescriptor,
        artwork: Option<&[u8]>,
    ) -> Result<()> {
        let mut tagged_file = Probe::open(path)
            .context("Failed to open audio file")?
            .read()
            .context("Failed to read audio file tags")?;

        let tag = match tagged_file.primary_tag_mut() {
            Some(tag) => tag,
            None => {
                if let Some(tag) = tagged_file.first_tag_mut() {
                    tag
                } else {
                    let tag_type = tagged_file.primary_tag_type();
                    tagged_file.insert_tag(lofty::tag::Tag::new(tag_type));
                    tagged_file
                        .primary_tag_mut()
                        .context("Failed to create tag")?
                }
            }
        };

        tag.set_artist(descriptor.artists.join(", "));
        if let Some(first) = descriptor.artists.first() {
            tag.insert_text(ItemKey::AlbumArtist, first.clone());
        }
        tag.set_album(descriptor.album.clone());
        tag.set_title(descriptor.title.clone());
        if let Ok(year) = descriptor.release_year.parse::<u32>() {
            tag.set_year(year);
        }
        tag.set_disk(descriptor.disc_number);
        tag.set_track(descriptor.track_number);

        if let Some(data) = artwork {
            let processed = process_cover_art(data)?;
            let picture = Picture::new_unchecked(
                PictureType::CoverFront,
                Some(MimeType::Jpeg),
                None,
                processed,
            );
            tag.remove_picture_type(PictureType::CoverFront);
            tag.push_picture(picture);
        }

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .context("Failed to save audio file tags")?;

        debug!("Wrote tags: {}", path.display());
        Ok(())
    }
}

/// Decode, resize and re-encode cover art as JPEG, reducing quality until it
/// fits under [`MAX_COVER_BYTES`].
pub fn process_cover_art(data: &[u8]) -> Result<Vec<u8>> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("Failed to guess image format")?
        .decode()
        .context("Failed to decode cover art")?;

    let img = resize_to_fit(img);

    let mut quality = JPEG_QUALITY;
    loop {
        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
        encoder
            .encode_image(&img)
            .context("Failed to encode cover art as JPEG")?;

        if output.len() <= MAX_COVER_BYTES || quality <= 50 {
            debug!(
                "Processed cover art: {}x{} -> {} bytes (quality {})",
                img.width(),
                img.height(),
                output.len(),
                quality
            );
            return Ok(output);
        }

        quality -= 10;
    }
}

fn resize_to_fit(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());

    if width <= MAX_COVER_SIZE && height <= MAX_COVER_SIZE {
        return img;
    }

    let (new_width, new_height) = if width > height {
        let ratio = MAX_COVER_SIZE as f64 / width as f64;
        (MAX_COVER_SIZE, (height as f64 * ratio) as u32)
    } else {
        let ratio = MAX_COVER_SIZE as f64 / height as f64;
        ((width as f64 * ratio) as u32, MAX_COVER_SIZE)
    };

    debug!(
        "Resizing cover art: {}x{} -> {}x{}",
        width, height, new_width, new_height
    );

    img.resize(new_width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_image_is_not_resized() {
        let img = DynamicImage::new_rgb8(100, 100);
        let resized = resize_to_fit(img);
        assert_eq!(resized.width(), 100);
        assert_eq!(resized.height(), 100);
    }

    #[test]
    fn large_image_is_bounded() {
        let img = DynamicImage::new_rgb8(1500, 1000);
        let resized = resize_to_fit(img);
        assert_eq!(resized.width(), MAX_COVER_SIZE);
        assert!(resized.height() <= MAX_COVER_SIZE);
    }

    #[test]
    fn processes_png_to_jpeg() {
        let img = DynamicImage::new_rgb8(32, 32);
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let jpeg = process_cover_art(&png).unwrap();
        assert!(!jpeg.is_empty());
        assert!(jpeg.len() <= MAX_COVER_BYTES);
    }
}
