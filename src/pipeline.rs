//! Render pipeline controller.
//!
//! Drives encoding, styling and logo compositing for one [`RenderConfig`] at a
//! time. Every request takes the next sequence number; a completion whose
//! number is no longer the latest issued is dropped, so a slow stale render
//! can never replace the result of a newer one.
//!
//! ```rust
//! use qrcanvas::config::{ModuleStyle, RenderConfig};
//! use qrcanvas::pipeline::RenderPipeline;
//!
//! let mut pipeline = RenderPipeline::new();
//! let config = RenderConfig { module_style: ModuleStyle::Rounded, ..RenderConfig::default() };
//! let artifact = pipeline.render(&config).unwrap();
//! assert!(artifact.is_styled());
//! assert!(artifact.to_data_url().starts_with("data:image/png;base64,"));
//! ```

use std::collections::VecDeque;
use std::fmt;

use image::RgbaImage;
use log::{debug, warn};

use crate::config::{Color, GeometryKey, LogoConfig, RenderConfig};
use crate::encoder::{self, EncodeOptions, Raster};
use crate::error::{RenderError, RenderFailed};
use crate::geometry::{self, ModuleGeometry};
use crate::helper;
use crate::logo;
use crate::style;

/// Where the controller is in its current render cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderState {
    #[default]
    Idle,
    Encoding,
    Styling,
    Compositing,
    Ready,
}

/// The output of one completed render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedArtifact {
    seq: u64,
    canvas: RgbaImage,
    png: Vec<u8>,
    styled: bool,
}

impl RenderedArtifact {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Whether the canvas was redrawn by the style renderer.
    pub fn is_styled(&self) -> bool {
        self.styled
    }

    pub fn to_data_url(&self) -> String {
        helper::to_data_url(&self.png)
    }
}

/// A render whose encoding and styling are done and whose logo step is
/// still pending.
#[derive(Debug)]
pub struct RenderJob {
    seq: u64,
    canvas: RgbaImage,
    styled: bool,
    logo: Option<LogoConfig>,
    logo_center: (u32, u32),
}

impl RenderJob {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The canvas before the logo overlay, for progressive display.
    pub fn preview(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn has_pending_logo(&self) -> bool {
        self.logo.is_some()
    }
}

type Listener = Box<dyn FnMut(&RenderedArtifact)>;

/// Geometries kept for recently rendered configs; the least recently used
/// one is evicted first.
pub const GEOMETRY_CACHE_CAPACITY: usize = 8;

#[derive(Default)]
pub struct RenderPipeline {
    state: RenderState,
    issued: u64,
    current: Option<RenderedArtifact>,
    listeners: Vec<Listener>,
    geometry_cache: VecDeque<(GeometryKey, ModuleGeometry)>,
}

impl fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("state", &self.state)
            .field("issued", &self.issued)
            .field("current", &self.current.as_ref().map(RenderedArtifact::seq))
            .field("listeners", &self.listeners.len())
            .field("cached_geometries", &self.geometry_cache.len())
            .finish()
    }
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The last committed artifact, if any.
    pub fn current(&self) -> Option<&RenderedArtifact> {
        self.current.as_ref()
    }

    /// Sequence number of the most recently issued request.
    pub fn latest_seq(&self) -> u64 {
        self.issued
    }

    /// Registers a callback invoked after every committed render.
    pub fn subscribe(&mut self, listener: impl FnMut(&RenderedArtifact) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Renders `config` to completion.
    pub fn render(&mut self, config: &RenderConfig) -> Result<&RenderedArtifact, RenderFailed> {
        let job = self.begin(config)?;
        let seq = job.seq;
        match self.finish(job)? {
            Some(artifact) => Ok(artifact),
            None => Err(RenderFailed { seq, reason: RenderError::Superseded }),
        }
    }

    /// Issues a new request and runs encoding and styling for it.
    ///
    /// Any job issued earlier becomes stale: finishing it afterwards is a no-op.
    pub fn begin(&mut self, config: &RenderConfig) -> Result<RenderJob, RenderFailed> {
        self.issued += 1;
        let seq = self.issued;
        match self.prepare(seq, config) {
            Ok(job) => Ok(job),
            Err(reason) => {
                warn!("render #{seq} aborted: {reason}");
                self.state = RenderState::Idle;
                Err(RenderFailed { seq, reason })
            }
        }
    }

    /// Composites the pending logo, exports the canvas and commits the
    /// result if `job` is still the latest request.
    ///
    /// Returns `Ok(None)` for a stale job. A logo that fails to load is
    /// logged and skipped.
    pub fn finish(&mut self, job: RenderJob) -> Result<Option<&RenderedArtifact>, RenderFailed> {
        let RenderJob { seq, mut canvas, styled, logo, logo_center } = job;
        if seq != self.issued {
            debug!("discarding render #{seq}, #{} is newer", self.issued);
            return Ok(None);
        }

        if let Some(logo) = logo {
            self.state = RenderState::Compositing;
            if let Err(err) = logo::composite_at(&mut canvas, &logo, logo_center) {
                warn!("render #{seq} continues without logo: {err}");
            }
        }

        let png = match helper::encode_png(&canvas) {
            Ok(png) => png,
            Err(err) => {
                self.state = RenderState::Idle;
                return Err(RenderFailed { seq, reason: RenderError::Export(err) });
            }
        };

        self.state = RenderState::Ready;
        let artifact: &RenderedArtifact =
            self.current.insert(RenderedArtifact { seq, canvas, png, styled });
        for listener in self.listeners.iter_mut() {
            listener(artifact);
        }
        debug!("render #{seq} committed");
        Ok(Some(artifact))
    }

    fn prepare(&mut self, seq: u64, config: &RenderConfig) -> Result<RenderJob, RenderError> {
        self.state = RenderState::Encoding;
        let payload = config.effective_payload();

        if !config.needs_styling() {
            let options = encode_options(config, config.color_dark, config.color_light);
            let raster = encoder::encode(payload, &options)?;
            let logo_center = raster.symbol_center();
            let canvas = raster.image;
            return Ok(RenderJob { seq, canvas, styled: false, logo: None, logo_center });
        }

        // Extraction reads the red channel, so the source raster is always black on white.
        let raster = encoder::encode(payload, &encode_options(config, Color::BLACK, Color::WHITE))?;
        self.state = RenderState::Styling;
        let logo = config.logo.clone();
        let logo_center = raster.symbol_center();
        match self.geometry_for(config, &raster) {
            Ok(geometry) => {
                let canvas = style::render(&raster.image, &geometry, config);
                Ok(RenderJob { seq, canvas, styled: true, logo, logo_center })
            }
            Err(err) => {
                warn!("render #{seq} falls back to the unstyled raster: {err}");
                let options = encode_options(config, config.color_dark, config.color_light);
                let raster = encoder::encode(payload, &options)?;
                Ok(RenderJob { seq, canvas: raster.image, styled: false, logo, logo_center })
            }
        }
    }

    fn geometry_for(
        &mut self,
        config: &RenderConfig,
        raster: &Raster,
    ) -> Result<ModuleGeometry, RenderError> {
        let key = config.geometry_key();
        if let Some(index) = self.geometry_cache.iter().position(|(cached, _)| *cached == key) {
            if let Some(entry) = self.geometry_cache.remove(index) {
                let geometry = entry.1;
                self.geometry_cache.push_back(entry);
                return Ok(geometry);
            }
        }
        let geometry = geometry::extract(&raster.image, raster.margin_px)?;
        if geometry.dimension != raster.modules {
            warn!("extracted {} modules, encoder reported {}", geometry.dimension, raster.modules);
        }
        if self.geometry_cache.len() == GEOMETRY_CACHE_CAPACITY {
            self.geometry_cache.pop_front();
        }
        self.geometry_cache.push_back((key, geometry));
        Ok(geometry)
    }
}

fn encode_options(config: &RenderConfig, dark: Color, light: Color) -> EncodeOptions {
    EncodeOptions {
        pixel_size: config.pixel_size,
        margin: config.margin,
        level: config.error_correction_level,
        dark,
        light,
    }
}
