use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use hookframe::rendering::render_preview_png;
use hookframe::{DisplayMetrics, Platform, PostFormat, PostSettings, SettingsPatch, Studio, StudioConfig};

#[derive(Parser, Debug)]
#[command(name = "hookframe", version, about = "Render short hooks into platform-sized PNG images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render and export PNGs
    Render(RenderArgs),
    /// Print the derived layout plan as JSON
    Plan(PostArgs),
    /// List the supported platforms and their canvas sizes
    Platforms,
}

#[derive(Args, Debug)]
struct PostArgs {
    /// Settings JSON (camelCase fields, as saved by a front end)
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    subtitle: Option<String>,
    #[arg(long)]
    format: Option<PostFormat>,
    #[arg(long)]
    platform: Option<Platform>,
    #[arg(long)]
    highlight: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    handle: Option<String>,
    /// Let landscape canvases grow or shrink with the content
    #[arg(long)]
    dynamic_height: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    post: PostArgs,
    /// Export every platform instead of just the selected one
    #[arg(long)]
    all_platforms: bool,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    pixel_ratio: Option<f32>,
    /// Also write the rounded on-screen preview to this file
    #[arg(long)]
    preview: Option<PathBuf>,
}

impl PostArgs {
    fn load_settings(&self) -> Result<PostSettings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading settings from {}", path.display()))?;
                PostSettings::from_json(&json)?
            }
            None => PostSettings::default(),
        };
        settings.merge(SettingsPatch {
            content: self.content.clone(),
            subtitle: self.subtitle.clone(),
            format: self.format,
            platform: self.platform,
            highlight_text: self.highlight.clone(),
            creator_name: self.name.clone(),
            creator_handle: self.handle.clone(),
            ..Default::default()
        });
        Ok(settings)
    }

    fn config(&self) -> StudioConfig {
        let mut cfg = StudioConfig::from_env();
        cfg.dynamic_height |= self.dynamic_height;
        cfg
    }
}

async fn render(args: RenderArgs) -> Result<()> {
    let mut cfg = args.post.config();
    if let Some(dir) = args.out_dir {
        cfg.output_dir = dir;
    }
    if let Some(r) = args.pixel_ratio {
        cfg.pixel_ratio = r;
    }

    let mut studio = Studio::new(cfg)?;
    studio.replace_settings(args.post.load_settings()?);
    let budget = studio.settings().char_budget();
    if budget.exceeded() {
        log::warn!("content is {} characters, above the {} guideline", budget.used, budget.limit);
    }
    let frame = studio.mount_preview(DisplayMetrics::default());

    if let Some(path) = &args.preview {
        let shot = render_preview_png(&frame, studio.fonts())?;
        std::fs::write(path, &shot.png_data).with_context(|| format!("writing preview {}", path.display()))?;
        info!("preview written to {} ({}x{})", path.display(), shot.width, shot.height);
    }

    let targets: Vec<Platform> = if args.all_platforms {
        Platform::ALL.to_vec()
    } else {
        vec![studio.settings().platform]
    };

    let mut failures = 0;
    for platform in targets {
        match studio.export_for_platform(platform).await {
            Ok(out) => println!("{}\t{}x{}\t{}", platform, out.width, out.height, out.path.display()),
            Err(e) => {
                eprintln!("{}: {}{}", platform, e, if e.is_retryable() { " (retryable)" } else { "" });
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{} export(s) failed", failures);
    }
    Ok(())
}

fn plan(args: PostArgs) -> Result<()> {
    let studio = Studio::new(args.config())?;
    let plan = studio.derive_layout(&args.load_settings()?);
    println!("{}", serde_json::to_string_pretty(&*plan)?);
    Ok(())
}

fn platforms() {
    for p in Platform::ALL {
        let d = p.dimensions();
        println!("{:<16}{:>5}x{:<5} {:<6} {}", p.slug(), d.width, d.height, d.aspect_ratio, d.description);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render(args).await?,
        Commands::Plan(args) => plan(args)?,
        Commands::Platforms => platforms(),
    }
    Ok(())
}
