//! Font book: resolves a `FontFamily` + weight to a loaded TTF
//!
//! Fonts are looked up by file name in a list of directories. The first
//! candidate of a family is its own face; later candidates are metric-similar
//! system fallbacks, used with a warning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use rusttype::{point, Font, Scale};

use crate::rendering::text::{text_width, TextMeasure, TextStyle};
use crate::style::{FontFamily, FontWeight};
use crate::{Error, Result};

/// Thread-safe cache of loaded fonts
pub struct FontBook {
    dirs: Vec<PathBuf>,
    loaded: Mutex<HashMap<PathBuf, Arc<Font<'static>>>>,
    /// Face chosen per family and weight; `None` when nothing resolves
    faces: Mutex<HashMap<(FontFamily, FontWeight), Option<Arc<Font<'static>>>>>,
}

/// Advance width of `text` laid out by rusttype, kerning included
pub fn run_width(font: &Font<'static>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

impl FontBook {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            loaded: Mutex::new(HashMap::new()),
            faces: Mutex::new(HashMap::new()),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn find_file(&self, name: &str) -> Option<PathBuf> {
        self.dirs.iter().map(|d| d.join(name)).find(|p| p.is_file())
    }

    fn load(&self, path: &Path) -> Result<Arc<Font<'static>>> {
        let mut cache = self
            .loaded
            .lock()
            .map_err(|_| Error::Other("font cache poisoned".into()))?;
        if let Some(font) = cache.get(path) {
            return Ok(font.clone());
        }
        let bytes = std::fs::read(path)?;
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| Error::FontUnavailable(format!("{} is not a usable TrueType font", path.display())))?;
        debug!("loaded font {}", path.display());
        let font = Arc::new(font);
        cache.insert(path.to_path_buf(), font.clone());
        Ok(font)
    }

    /// Resolve a face for `family` at `weight`.
    ///
    /// Heavy weights try the bold files first and then the regular ones.
    pub fn resolve(&self, family: FontFamily, weight: FontWeight) -> Result<Arc<Font<'static>>> {
        let d = family.descriptor();
        let candidates: Vec<&str> = if weight.is_heavy() {
            d.bold_files.iter().chain(d.regular_files).copied().collect()
        } else {
            d.regular_files.iter().chain(d.bold_files).copied().collect()
        };

        for (i, name) in candidates.iter().enumerate() {
            if let Some(path) = self.find_file(name) {
                if i > 0 {
                    warn!("{} ({:?}) not installed, using {}", d.name, weight, path.display());
                }
                return self.load(&path);
            }
        }

        if family != FontFamily::DmSans {
            warn!("no face found for {}, falling back to DM Sans candidates", d.name);
            return self.resolve(FontFamily::DmSans, weight);
        }

        Err(Error::FontUnavailable(format!(
            "{} not found in {:?}",
            d.name, self.dirs
        )))
    }

    /// True when at least one face can be loaded
    pub fn has_any(&self) -> bool {
        self.resolve(FontFamily::DmSans, FontWeight::Regular).is_ok()
    }

    /// Memoized [`resolve`](Self::resolve), so fallbacks are reported once.
    pub fn face(&self, family: FontFamily, weight: FontWeight) -> Option<Arc<Font<'static>>> {
        let mut faces = self.faces.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        faces
            .entry((family, weight))
            .or_insert_with(|| self.resolve(family, weight).ok())
            .clone()
    }
}

/// Real glyph advances where a face resolves, the advance table otherwise
impl TextMeasure for FontBook {
    fn width(&self, text: &str, style: TextStyle) -> f32 {
        match self.face(style.family, style.weight) {
            Some(font) => run_width(&font, Scale::uniform(style.size), text),
            None => text_width(text, style.size, style.family, style.weight),
        }
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook").field("dirs", &self.dirs).finish()
    }
}
