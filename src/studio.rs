//! Editing session: the single owner of `PostSettings`
//!
//! Every settings change re-derives the layout plan in full. A mounted
//! preview holds a `CaptureHandle` to the current plan; exports require one.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::export::{DirectoryDownloader, Downloader, ExportOptions, ExportOutcome, ExportStatus, Exporter};
use crate::platform::{DisplayMetrics, Platform};
use crate::rendering::{derive_layout_with, CaptureHandle, Estimated, FontBook, LayoutOptions, LayoutPlan, PreviewFrame, TextMeasure};
use crate::settings::{PostSettings, SettingsPatch};
use crate::{Error, Result, StudioConfig};

/// Small LRU of derived plans keyed by a settings digest
#[derive(Debug)]
struct LayoutCache {
    capacity: usize,
    entries: VecDeque<(String, Arc<LayoutPlan>)>,
}

impl LayoutCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    fn get(&mut self, key: &str) -> Option<Arc<LayoutPlan>> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos)?;
        let plan = entry.1.clone();
        self.entries.push_back(entry);
        Some(plan)
    }

    fn insert(&mut self, key: String, plan: Arc<LayoutPlan>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, plan));
    }
}

/// Digest of everything that influences a layout
fn cache_key(settings: &PostSettings, options: &LayoutOptions) -> String {
    let mut hasher = Sha256::new();
    // Serializing plain strings, bools and enums cannot fail.
    hasher.update(serde_json::to_vec(settings).unwrap_or_default());
    hasher.update([options.dynamic_height as u8]);
    hex::encode(hasher.finalize())
}

pub struct Studio {
    config: StudioConfig,
    settings: PostSettings,
    plan: Arc<LayoutPlan>,
    mounted: Option<CaptureHandle>,
    cache: Mutex<LayoutCache>,
    /// Installed faces when any load, so rasterized text fits its boxes
    measure: Arc<dyn TextMeasure>,
    exporter: Exporter,
}

impl Studio {
    /// A studio that saves exports into `config.output_dir`.
    pub fn new(config: StudioConfig) -> Result<Self> {
        let downloader = Arc::new(DirectoryDownloader::new(config.output_dir.clone()));
        Self::with_downloader(config, downloader)
    }

    pub fn with_downloader(config: StudioConfig, downloader: Arc<dyn Downloader>) -> Result<Self> {
        config.validate()?;
        let fonts = Arc::new(FontBook::new(config.font_dirs.clone()));
        let measure = if fonts.has_any() {
            fonts.clone() as Arc<dyn TextMeasure>
        } else {
            info!("no fonts in {:?}, laying text out with estimated advances", config.font_dirs);
            Arc::new(Estimated)
        };
        let exporter = Exporter::new(
            fonts,
            downloader,
            ExportOptions {
                filename_prefix: config.filename_prefix.clone(),
                success_dismiss: config.success_dismiss(),
                error_dismiss: config.error_dismiss(),
            },
        );
        let settings = PostSettings::default();
        let options = LayoutOptions {
            dynamic_height: config.dynamic_height,
        };
        let plan = Arc::new(derive_layout_with(&settings, &options, measure.as_ref()));
        let mut cache = LayoutCache::new(config.layout_cache_capacity);
        cache.insert(cache_key(&settings, &options), plan.clone());
        Ok(Self {
            config,
            settings,
            plan,
            mounted: None,
            cache: Mutex::new(cache),
            measure,
            exporter,
        })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn settings(&self) -> &PostSettings {
        &self.settings
    }

    /// The plan for the current settings
    pub fn plan(&self) -> &Arc<LayoutPlan> {
        &self.plan
    }

    fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            dynamic_height: self.config.dynamic_height,
        }
    }

    /// Shallow-merge `patch` and recompute the layout.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Arc<LayoutPlan> {
        debug!("merging settings patch {:?}", patch);
        self.settings.merge(patch);
        self.plan = self.derive_layout(&self.settings);
        if self.mounted.is_some() {
            self.mounted = Some(self.plan.capture_handle());
        }
        self.plan.clone()
    }

    /// Replace all settings at once.
    pub fn replace_settings(&mut self, settings: PostSettings) -> Arc<LayoutPlan> {
        self.settings = settings;
        self.plan = self.derive_layout(&self.settings);
        if self.mounted.is_some() {
            self.mounted = Some(self.plan.capture_handle());
        }
        self.plan.clone()
    }

    /// Derive (or fetch from cache) the plan for arbitrary settings.
    pub fn derive_layout(&self, settings: &PostSettings) -> Arc<LayoutPlan> {
        let options = self.layout_options();
        let key = cache_key(settings, &options);
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(plan) = cache.get(&key) {
            debug!("layout cache hit {}", &key[..12]);
            return plan;
        }
        debug!("layout cache miss {}", &key[..12]);
        let plan = Arc::new(derive_layout_with(settings, &options, self.measure.as_ref()));
        cache.insert(key, plan.clone());
        plan
    }

    /// Mount the preview: returns the scaled frame and makes exports possible.
    pub fn mount_preview(&mut self, display: DisplayMetrics) -> PreviewFrame {
        self.mounted = Some(self.plan.capture_handle());
        self.plan.preview(display)
    }

    pub fn unmount_preview(&mut self) {
        self.mounted = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Export the current post for `platform` at the configured pixel ratio.
    ///
    /// Other platforms are laid out afresh from the same settings, so any
    /// platform can be exported without switching the preview.
    pub async fn export_for_platform(&self, platform: Platform) -> Result<ExportOutcome> {
        let Some(mounted) = &self.mounted else {
            return Err(self.exporter.reject(Error::PreviewNotReady));
        };
        if !self.settings.has_content() {
            return Err(self.exporter.reject(Error::EmptyContent));
        }
        let handle = if platform == mounted.platform {
            mounted.clone()
        } else {
            self.derive_layout(&self.settings.for_platform(platform)).capture_handle()
        };
        let (width, height) = (handle.tree().width.round() as u32, handle.tree().height.round() as u32);
        self.exporter
            .export(Some(handle), width, height, self.config.pixel_ratio)
            .await
    }

    pub fn export_status(&self) -> ExportStatus {
        self.exporter.status()
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    pub fn fonts(&self) -> &Arc<FontBook> {
        self.exporter.fonts()
    }
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("settings", &self.settings)
            .field("mounted", &self.mounted.is_some())
            .field("exporter", &self.exporter)
            .finish()
    }
}
