//! Export engine integration tests

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hookframe::rendering::FontBook;
use hookframe::{
    DisplayMetrics, Downloader, Error, ExportStatus, Platform, PostFormat, SettingsPatch, Studio, StudioConfig,
};

fn config(out: &std::path::Path) -> StudioConfig {
    StudioConfig {
        output_dir: out.to_path_buf(),
        ..StudioConfig::default()
    }
}

fn fonts_available(cfg: &StudioConfig) -> bool {
    let ok = FontBook::new(cfg.font_dirs.clone()).has_any();
    if !ok {
        println!("No usable TTF in {:?}; skipping raster assertions.", cfg.font_dirs);
    }
    ok
}

fn hook() -> SettingsPatch {
    SettingsPatch {
        content: Some("Most people think they need more time. They don't.".into()),
        format: Some(PostFormat::HookOnly),
        platform: Some(Platform::Instagram),
        ..Default::default()
    }
}

fn files_in(dir: &std::path::Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn export_without_mounted_preview_is_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    let mut studio = Studio::new(config(dir.path())).unwrap();
    studio.update_settings(hook());

    let err = studio.export_for_platform(Platform::Instagram).await.unwrap_err();
    assert!(matches!(err, Error::PreviewNotReady));
    assert!(!err.is_retryable());
    assert!(files_in(dir.path()).is_empty());
    assert!(matches!(studio.export_status(), ExportStatus::Failed { retryable: false, .. }));
}

#[tokio::test]
async fn unmounting_disables_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut studio = Studio::new(config(dir.path())).unwrap();
    studio.update_settings(hook());
    studio.mount_preview(DisplayMetrics::default());
    studio.unmount_preview();
    assert!(matches!(
        studio.export_for_platform(Platform::Instagram).await,
        Err(Error::PreviewNotReady)
    ));
}

#[tokio::test]
async fn square_export_is_exactly_target_times_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    if !fonts_available(&cfg) {
        return;
    }
    let mut studio = Studio::new(cfg).unwrap();
    studio.update_settings(hook());
    studio.mount_preview(DisplayMetrics::default());

    let out = studio.export_for_platform(Platform::Instagram).await.unwrap();
    assert_eq!((out.width, out.height), (2160, 2160));
    let name = out.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("hookframe-hook-only-instagram-1080x1080-"), "{}", name);

    let img = image::open(&out.path).unwrap();
    assert_eq!((img.width(), img.height()), (2160, 2160));
    // No display rounding: the corner pixel is the opaque background.
    let corner = img.to_rgba8().get_pixel(0, 0).0;
    assert_eq!(corner, [0, 0, 0, 255]);
    assert!(matches!(studio.export_status(), ExportStatus::Exported { platform: Platform::Instagram, .. }));
}

#[tokio::test]
async fn any_platform_can_be_exported_from_one_preview() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StudioConfig {
        pixel_ratio: 1.0,
        ..config(dir.path())
    };
    if !fonts_available(&cfg) {
        return;
    }
    let mut studio = Studio::new(cfg).unwrap();
    studio.update_settings(hook());
    studio.mount_preview(DisplayMetrics::default());

    for platform in Platform::ALL {
        let out = studio.export_for_platform(platform).await.unwrap();
        let d = platform.dimensions();
        assert_eq!((out.width, out.height), (d.width, d.height));
    }
    assert_eq!(files_in(dir.path()).len(), Platform::ALL.len());
    assert_eq!(studio.settings().platform, Platform::Instagram);
}

#[tokio::test]
async fn concurrent_export_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut studio = Studio::new(config(dir.path())).unwrap();
    studio.update_settings(hook());
    studio.mount_preview(DisplayMetrics::default());

    let (a, b) = tokio::join!(
        studio.export_for_platform(Platform::Instagram),
        studio.export_for_platform(Platform::Instagram)
    );
    let busy = [&a, &b].iter().filter(|r| matches!(r, Err(Error::ExportInProgress))).count();
    assert_eq!(busy, 1, "exactly one export must be turned away: {:?} / {:?}", a, b);
    assert!(!studio.exporter().is_busy());
}

struct BrokenDisk;

impl Downloader for BrokenDisk {
    fn save(&self, _filename: &str, _png: &[u8]) -> hookframe::Result<PathBuf> {
        Err(Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
    }
}

#[tokio::test]
async fn download_failure_is_retryable_and_keeps_settings() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StudioConfig {
        error_dismiss_ms: 50,
        ..config(dir.path())
    };
    let mut studio = Studio::with_downloader(cfg, Arc::new(BrokenDisk)).unwrap();
    studio.update_settings(hook());
    studio.mount_preview(DisplayMetrics::default());
    let before = studio.settings().clone();

    let err = studio.export_for_platform(Platform::Instagram).await.unwrap_err();
    assert!(err.is_retryable(), "{}", err);
    assert!(matches!(studio.export_status(), ExportStatus::Failed { retryable: true, .. }));
    assert_eq!(studio.settings(), &before);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(studio.export_status(), ExportStatus::Idle);
}

#[tokio::test]
async fn remote_avatar_failure_is_retryable() {
    let dir = tempfile::tempdir().unwrap();
    let mut studio = Studio::new(config(dir.path())).unwrap();
    studio.update_settings(SettingsPatch {
        content: Some("Hook".into()),
        format: Some(PostFormat::CreatorCard),
        creator_name: Some("Remote Person".into()),
        creator_avatar: Some("http://127.0.0.1:9/avatar.png".into()),
        ..Default::default()
    });
    studio.mount_preview(DisplayMetrics::default());

    let err = studio.export_for_platform(Platform::Facebook).await.unwrap_err();
    assert!(matches!(err, Error::AvatarError(_)), "{}", err);
    assert!(err.is_retryable());
    assert!(files_in(dir.path()).is_empty());
}

#[cfg(feature = "remote-avatars")]
#[tokio::test]
async fn remote_avatar_is_fetched_when_enabled() {
    use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};
    use tiny_http::{Response, Server};

    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    if !fonts_available(&cfg) {
        return;
    }

    let img: RgbaImage = ImageBuffer::from_pixel(8, 8, Rgba([0, 200, 0, 255]));
    let mut png = std::io::Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png).unwrap();
    let png = png.into_inner();

    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let _ = request.respond(Response::from_data(png.clone()));
        }
    });

    let mut studio = Studio::new(cfg).unwrap();
    studio.update_settings(SettingsPatch {
        content: Some("Hook".into()),
        format: Some(PostFormat::CreatorCard),
        creator_name: Some("Remote Person".into()),
        creator_avatar: Some(format!("http://{}/me.png", addr)),
        ..Default::default()
    });
    studio.mount_preview(DisplayMetrics::default());
    let out = studio.export_for_platform(Platform::Facebook).await.unwrap();
    assert!(out.path.exists());
}

#[tokio::test]
async fn success_status_auto_dismisses() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StudioConfig {
        pixel_ratio: 1.0,
        success_dismiss_ms: 50,
        ..config(dir.path())
    };
    if !fonts_available(&cfg) {
        return;
    }
    let mut studio = Studio::new(cfg).unwrap();
    studio.update_settings(hook());
    studio.mount_preview(DisplayMetrics::default());
    studio.export_for_platform(Platform::Instagram).await.unwrap();
    assert!(matches!(studio.export_status(), ExportStatus::Exported { .. }));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(studio.export_status(), ExportStatus::Idle);
}
