use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use log::info;

use qrcanvas::config::{Color, EccLevel, LogoConfig, ModuleStyle, PixelSize, RenderConfig};
use qrcanvas::encoder::{self, EncodeOptions};
use qrcanvas::helper::{print_modules, save_png, ExportName};
use qrcanvas::{geometry, RenderPipeline};

#[derive(Parser, Debug)]
#[command(name = "qrcanvas")]
#[command(about = "Render styled QR codes to PNG", long_about = None)]
struct Args {
    /// Text or URL to encode
    payload: Option<String>,

    /// JSON render config; flags below override its fields
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Canvas side in pixels
    #[arg(long, short = 's')]
    size: Option<u32>,

    /// Quiet zone in modules
    #[arg(long)]
    margin: Option<u32>,

    /// square, rounded, dot or liquid
    #[arg(long)]
    style: Option<ModuleStyle>,

    /// Error correction level: L, M, Q or H
    #[arg(long)]
    ecc: Option<EccLevel>,

    #[arg(long)]
    dark: Option<Color>,

    #[arg(long)]
    light: Option<Color>,

    /// Fill modules with a gradient between two colors
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    gradient: Option<Vec<Color>>,

    /// Image file placed in the center
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Output directory
    #[arg(long, short = 'o')]
    out: Option<String>,

    /// Identifier used in the file name instead of a timestamp
    #[arg(long)]
    name: Option<String>,

    /// Print the module grid to the console
    #[arg(long)]
    print: bool,
}

impl Args {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RenderConfig::default(),
        };
        if let Some(payload) = &self.payload {
            config.payload = payload.clone();
        }
        if let Some(size) = self.size {
            config.pixel_size = PixelSize::square(size);
        }
        if let Some(margin) = self.margin {
            config.margin = margin;
        }
        if let Some(style) = self.style {
            config.module_style = style;
        }
        if let Some(ecc) = self.ecc {
            config.error_correction_level = ecc;
        }
        if let Some(dark) = self.dark {
            config.color_dark = dark;
        }
        if let Some(light) = self.light {
            config.color_light = light;
        }
        if let Some([start, end]) = self.gradient.as_deref() {
            config.gradient_enabled = true;
            config.gradient_start = *start;
            config.gradient_end = *end;
        }
        if let Some(path) = &self.logo {
            let bytes = fs::read(path).with_context(|| format!("reading logo {}", path.display()))?;
            config.logo = Some(LogoConfig::new(bytes));
        }
        Ok(config)
    }
}

fn print_grid(config: &RenderConfig) -> Result<()> {
    let raster = encoder::encode(
        config.effective_payload(),
        &EncodeOptions {
            pixel_size: config.pixel_size,
            margin: config.margin,
            level: config.error_correction_level,
            dark: Color::BLACK,
            light: Color::WHITE,
        },
    )?;
    let geometry = geometry::extract(&raster.image, raster.margin_px)?;
    print_modules(&raster.image, &geometry);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.render_config()?;

    let mut pipeline = RenderPipeline::new();
    let artifact = pipeline.render(&config)?;

    let name = match &args.name {
        Some(name) => ExportName::ShortCode(name.clone()),
        None => ExportName::now(),
    };
    let path = save_png(artifact.png_bytes(), args.out.as_deref(), &name)?;
    info!("saved {} ({} bytes)", path.display(), artifact.png_bytes().len());

    if args.print {
        print_grid(&config)?;
    }
    Ok(())
}
