use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Decodes `data:image/...;base64,` uploads and stores them below the media
/// directory, named by content hash.
pub struct MediaStore {
    media_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Expected a data:image/<type>;base64, string")]
    NotDataUri,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Not a valid image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageError {
    /// True when the upload itself is at fault, as opposed to the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ImageError::Io(_))
    }
}

/// A decoded upload, not yet written anywhere.
#[derive(Debug)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }

    pub fn file_name(&self) -> String {
        let hash = Sha256::digest(&self.bytes);
        format!("{}.{}", hex::encode(&hash[..16]), self.extension())
    }
}

pub fn decode_data_uri(data: &str) -> Result<DecodedImage, ImageError> {
    let rest = data.strip_prefix("data:image/").ok_or(ImageError::NotDataUri)?;
    let (_declared, payload) = rest.split_once(";base64,").ok_or(ImageError::NotDataUri)?;

    let bytes = STANDARD.decode(payload.trim())?;

    // Trust the bytes, not the declared type.
    let format = image::guess_format(&bytes)?;
    image::load_from_memory_with_format(&bytes, format)?;

    Ok(DecodedImage { bytes, format })
}

impl MediaStore {
    pub fn new(media_dir: PathBuf) -> Result<Self, ImageError> {
        fs::create_dir_all(&media_dir)?;
        Ok(Self { media_dir })
    }

    pub fn media_dir(&self) -> &PathBuf {
        &self.media_dir
    }

    /// Stores the image in `folder` and returns its path relative to the
    /// media directory.
    pub fn save(&self, folder: &str, image: &DecodedImage) -> Result<String, ImageError> {
        let dir = self.media_dir.join(folder);
        fs::create_dir_all(&dir)?;

        let file_name = image.file_name();
        let path = dir.join(&file_name);
        if !path.exists() {
            debug!("Writing image {:?}", path);
            fs::write(&path, &image.bytes)?;
        }

        Ok(format!("{}/{}", folder.trim_matches('/'), file_name))
    }

    pub fn save_data_uri(&self, folder: &str, data: &str) -> Result<String, ImageError> {
        let image = decode_data_uri(data)?;
        self.save(folder, &image)
    }
}

/// Public URL of a stored media path.
pub fn media_url(baseurl: &str, path: &str) -> String {
    format!("{}/media/{}", baseurl, path)
}

#[cfg(test)]
pub(crate) fn sample_png_data_uri() -> String {
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgb([200, 10, 10]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png() {
        let image = decode_data_uri(&sample_png_data_uri()).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.extension(), "png");
        assert!(image.file_name().ends_with(".png"));
    }

    #[test]
    fn test_rejects_non_data_uri() {
        assert!(matches!(
            decode_data_uri("https://example.com/cat.png"),
            Err(ImageError::NotDataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:image/png,abc"),
            Err(ImageError::NotDataUri)
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,!!!"),
            Err(ImageError::Base64(_))
        ));
        let not_an_image = STANDARD.encode(b"hello world");
        let err = decode_data_uri(&format!("data:image/png;base64,{}", not_an_image)).unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_save_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf()).unwrap();
        let uri = sample_png_data_uri();

        let first = store.save_data_uri("recipes/images", &uri).unwrap();
        let second = store.save_data_uri("recipes/images", &uri).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("recipes/images/"));
        assert!(dir.path().join(&first).exists());
        assert_eq!(
            media_url("http://localhost:8000", &first),
            format!("http://localhost:8000/media/{}", first)
        );
    }
}
