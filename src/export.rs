//! Export engine: rasterize a captured layout tree and hand the PNG to a
//! downloader.
//!
//! At most one export runs at a time. The raster work happens on a
//! dedicated worker thread and the result comes back over a oneshot
//! channel, so async callers never block their executor. Every outcome is
//! mirrored into an [`ExportStatus`] that resets to idle on its own after a
//! short delay.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::platform::Platform;
use crate::rendering::{render_png, CaptureHandle, FontBook};
use crate::settings::PostFormat;
use crate::{Error, Result};

/// Self-describing, collision-resistant output name
pub fn export_filename(
    prefix: &str,
    format: PostFormat,
    platform: Platform,
    width: u32,
    height: u32,
    timestamp_ms: u128,
) -> String {
    format!(
        "{}-{}-{}-{}x{}-{}.png",
        prefix,
        format.slug(),
        platform.slug(),
        width,
        height,
        timestamp_ms
    )
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Where finished PNGs go
pub trait Downloader: Send + Sync {
    /// Persist `png` under `filename` and return its final location.
    fn save(&self, filename: &str, png: &[u8]) -> Result<PathBuf>;
}

/// Writes exports into a directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloader for DirectoryDownloader {
    fn save(&self, filename: &str, png: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, png)?;
        Ok(path)
    }
}

/// User-visible export state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ExportStatus {
    #[default]
    Idle,
    Exporting {
        platform: Platform,
    },
    Exported {
        platform: Platform,
        path: PathBuf,
    },
    Failed {
        message: String,
        retryable: bool,
    },
}

impl ExportStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, ExportStatus::Exporting { .. })
    }
}

/// A finished export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub platform: Platform,
    pub path: PathBuf,
    /// Pixel size of the written PNG
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub filename_prefix: String,
    pub success_dismiss: Duration,
    pub error_dismiss: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename_prefix: "hookframe".to_string(),
            success_dismiss: Duration::from_millis(2000),
            error_dismiss: Duration::from_millis(4000),
        }
    }
}

#[derive(Debug, Default)]
struct StatusCell {
    /// Bumped on every change so stale dismiss timers are ignored
    generation: u64,
    status: ExportStatus,
}

fn lock(cell: &Mutex<StatusCell>) -> MutexGuard<'_, StatusCell> {
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Set `status`, and if `dismiss` is given, revert to idle after it elapses
/// unless something else changed the status first.
///
/// The dismiss timer is a task on the current tokio runtime. Outside a
/// runtime the status simply stays until the next change.
fn publish(cell: &Arc<Mutex<StatusCell>>, status: ExportStatus, dismiss: Option<Duration>) {
    let generation = {
        let mut c = lock(cell);
        c.generation += 1;
        c.status = status;
        c.generation
    };
    let Some(delay) = dismiss else {
        return;
    };
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("no tokio runtime, status will not auto-dismiss");
        return;
    };
    let cell = cell.clone();
    runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        let mut c = lock(&cell);
        if c.generation == generation {
            c.generation += 1;
            c.status = ExportStatus::Idle;
        }
    });
}

/// Clears the busy flag however the export future ends
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-flight PNG exporter
#[derive(Clone)]
pub struct Exporter {
    busy: Arc<AtomicBool>,
    status: Arc<Mutex<StatusCell>>,
    fonts: Arc<FontBook>,
    downloader: Arc<dyn Downloader>,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(fonts: Arc<FontBook>, downloader: Arc<dyn Downloader>, options: ExportOptions) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(StatusCell::default())),
            fonts,
            downloader,
            options,
        }
    }

    pub fn status(&self) -> ExportStatus {
        lock(&self.status).status.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn fonts(&self) -> &Arc<FontBook> {
        &self.fonts
    }

    /// Report a failed precondition without starting an export.
    ///
    /// A running export keeps its status.
    pub fn reject(&self, err: Error) -> Error {
        warn!("export rejected: {}", err);
        if !self.is_busy() {
            publish(
                &self.status,
                ExportStatus::Failed {
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                },
                Some(self.options.error_dismiss),
            );
        }
        err
    }

    /// Rasterize the tree behind `handle` at `target_width`×`target_height`
    /// times `pixel_ratio` and save it.
    pub async fn export(
        &self,
        handle: Option<CaptureHandle>,
        target_width: u32,
        target_height: u32,
        pixel_ratio: f32,
    ) -> Result<ExportOutcome> {
        let Some(handle) = handle else {
            return Err(self.reject(Error::PreviewNotReady));
        };
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("export for {} rejected: another export is running", handle.platform);
            return Err(Error::ExportInProgress);
        }
        let _guard = BusyGuard(self.busy.clone());

        let platform = handle.platform;
        publish(&self.status, ExportStatus::Exporting { platform }, None);
        info!(
            "exporting {} at {}x{} @{}x",
            platform, target_width, target_height, pixel_ratio
        );

        let res = self.run_worker(handle, target_width, target_height, pixel_ratio).await;

        match &res {
            Ok(outcome) => {
                info!("exported {} to {}", platform, outcome.path.display());
                publish(
                    &self.status,
                    ExportStatus::Exported {
                        platform,
                        path: outcome.path.clone(),
                    },
                    Some(self.options.success_dismiss),
                );
            }
            Err(err) => {
                error!("export for {} failed: {}", platform, err);
                publish(
                    &self.status,
                    ExportStatus::Failed {
                        message: err.to_string(),
                        retryable: err.is_retryable(),
                    },
                    Some(self.options.error_dismiss),
                );
            }
        }
        res
    }

    async fn run_worker(
        &self,
        handle: CaptureHandle,
        target_width: u32,
        target_height: u32,
        pixel_ratio: f32,
    ) -> Result<ExportOutcome> {
        let tree_width = handle.tree().width;
        if tree_width <= 0.0 || target_width == 0 || target_height == 0 {
            return Err(Error::RasterizationError(format!(
                "cannot export a {}x{} canvas",
                target_width, target_height
            )));
        }
        let k = target_width as f32 / tree_width;
        if (handle.tree().height * k - target_height as f32).abs() > 1.0 {
            return Err(Error::RasterizationError(format!(
                "target {}x{} does not match the captured {}x{} canvas",
                target_width,
                target_height,
                tree_width,
                handle.tree().height
            )));
        }

        let filename = export_filename(
            &self.options.filename_prefix,
            handle.format,
            handle.platform,
            target_width,
            target_height,
            now_ms(),
        );
        let fonts = self.fonts.clone();
        let downloader = self.downloader.clone();
        let (tx, rx) = oneshot::channel::<Result<ExportOutcome>>();

        thread::spawn(move || {
            let res = render_png(handle.tree(), k * pixel_ratio, &fonts).and_then(|shot| {
                let path = downloader.save(&filename, &shot.png_data)?;
                Ok(ExportOutcome {
                    platform: handle.platform,
                    path,
                    width: shot.width,
                    height: shot.height,
                })
            });
            let _ = tx.send(res);
        });

        rx.await
            .map_err(|e| Error::Other(format!("Export worker canceled: {}", e)))?
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("busy", &self.is_busy())
            .field("status", &self.status())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RefusingDownloader;

    impl Downloader for RefusingDownloader {
        fn save(&self, _filename: &str, _png: &[u8]) -> Result<PathBuf> {
            Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    fn exporter(options: ExportOptions) -> Exporter {
        Exporter::new(Arc::new(FontBook::new(Vec::new())), Arc::new(RefusingDownloader), options)
    }

    #[test]
    fn filename_describes_the_export() {
        let name = export_filename("hookframe", PostFormat::ListDrop, Platform::InstagramStory, 1080, 1920, 1700000000123);
        assert_eq!(name, "hookframe-list-drop-instagram-story-1080x1920-1700000000123.png");
    }

    #[test]
    fn directory_downloader_creates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let d = DirectoryDownloader::new(dir.path().join("nested/out"));
        let path = d.save("a.png", b"png").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"png");
    }

    #[tokio::test]
    async fn missing_handle_is_not_ready_and_not_retryable() {
        let ex = exporter(ExportOptions::default());
        let err = ex.export(None, 1200, 630, 2.0).await.unwrap_err();
        assert!(matches!(err, Error::PreviewNotReady));
        assert!(!ex.is_busy());
        assert!(matches!(ex.status(), ExportStatus::Failed { retryable: false, .. }));
    }

    #[tokio::test]
    async fn status_auto_dismisses() {
        let ex = exporter(ExportOptions {
            error_dismiss: Duration::from_millis(20),
            ..Default::default()
        });
        ex.reject(Error::EmptyContent);
        assert!(matches!(ex.status(), ExportStatus::Failed { .. }));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ex.status(), ExportStatus::Idle);
    }

    #[tokio::test]
    async fn newer_status_survives_stale_timer() {
        let ex = exporter(ExportOptions {
            error_dismiss: Duration::from_millis(30),
            ..Default::default()
        });
        ex.reject(Error::EmptyContent);
        publish(&ex.status, ExportStatus::Exporting { platform: Platform::Twitter }, None);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(ex.status().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_timer_runs_on_the_runtime() {
        let ex = exporter(ExportOptions {
            error_dismiss: Duration::from_secs(4),
            ..Default::default()
        });
        ex.reject(Error::PreviewNotReady);
        tokio::time::sleep(Duration::from_millis(3900)).await;
        assert!(matches!(ex.status(), ExportStatus::Failed { .. }));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ex.status(), ExportStatus::Idle);
    }

    #[test]
    fn outside_a_runtime_the_status_stays() {
        let ex = exporter(ExportOptions {
            error_dismiss: Duration::from_millis(10),
            ..Default::default()
        });
        ex.reject(Error::EmptyContent);
        std::thread::sleep(Duration::from_millis(100));
        assert!(matches!(ex.status(), ExportStatus::Failed { retryable: false, .. }));
    }
}
