//! Creator avatar sources: `data:` URLs, local files and remote URLs

use std::path::PathBuf;

use base64::Engine as Base64Engine;
use image::{imageops::FilterType, RgbaImage};
use log::debug;

use crate::{Error, Result};

/// Where an avatar image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// No picture; the renderer draws the initial placeholder
    None,
    /// Inline image bytes from a `data:` URL
    Embedded(Vec<u8>),
    File(PathBuf),
    Remote(url::Url),
}

impl AvatarSource {
    /// Classify the raw `creatorAvatar` setting.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(AvatarSource::None);
        }
        match url::Url::parse(raw) {
            Ok(u) if u.scheme() == "data" => decode_data_url(raw).map(AvatarSource::Embedded),
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Ok(AvatarSource::Remote(u)),
            Ok(u) if u.scheme() == "file" => u
                .to_file_path()
                .map(AvatarSource::File)
                .map_err(|_| Error::AvatarError(format!("bad file URL: {}", raw))),
            _ => Ok(AvatarSource::File(PathBuf::from(raw))),
        }
    }

    fn bytes(&self) -> Result<Option<Vec<u8>>> {
        match self {
            AvatarSource::None => Ok(None),
            AvatarSource::Embedded(b) => Ok(Some(b.clone())),
            AvatarSource::File(p) => std::fs::read(p)
                .map(Some)
                .map_err(|e| Error::AvatarError(format!("{}: {}", p.display(), e))),
            AvatarSource::Remote(u) => fetch_remote(u).map(Some),
        }
    }
}

fn decode_data_url(raw: &str) -> Result<Vec<u8>> {
    let (meta, payload) = raw
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| Error::AvatarError("malformed data URL".into()))?;
    if !meta.ends_with(";base64") {
        return Err(Error::AvatarError("only base64 data URLs are supported".into()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::AvatarError(format!("invalid base64 payload: {}", e)))
}

#[cfg(feature = "remote-avatars")]
fn fetch_remote(u: &url::Url) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(u.as_str())
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::AvatarError(format!("failed to fetch {}: {}", u, e)))?;
    let body = resp
        .bytes()
        .map_err(|e| Error::AvatarError(format!("failed to read {}: {}", u, e)))?;
    Ok(body.to_vec())
}

#[cfg(not(feature = "remote-avatars"))]
fn fetch_remote(u: &url::Url) -> Result<Vec<u8>> {
    Err(Error::AvatarError(format!(
        "remote avatar {} cannot be captured; upload the image instead",
        u
    )))
}

/// Load, center-crop and resize the avatar to a `size`×`size` square.
///
/// Returns `Ok(None)` when no avatar is set.
pub fn load_square(source: &AvatarSource, size: u32) -> Result<Option<RgbaImage>> {
    let Some(bytes) = source.bytes()? else {
        return Ok(None);
    };
    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::AvatarError(format!("invalid image: {}", e)))?
        .to_rgba8();
    debug!("avatar decoded at {}x{}", img.width(), img.height());

    let side = img.width().min(img.height()).max(1);
    let left = (img.width() - side.min(img.width())) / 2;
    let top = (img.height() - side.min(img.height())) / 2;
    let cropped = image::imageops::crop_imm(&img, left, top, side, side).to_image();
    let size = size.max(1);
    Ok(Some(image::imageops::resize(&cropped, size, size, FilterType::Lanczos3)))
}
