//! # qrcanvas
//!
//! A Rust library for rendering styled QR codes and serving them as editable dynamic codes.
//!
//! `qrcanvas` encodes a payload into a QR symbol, recovers the module grid from the rasterized
//! symbol and redraws every module with a chosen shape and fill. A logo can be composited on top.
//! Dynamic codes encode a short alias URL instead of the destination, so the destination can be
//! changed later without reprinting the code.
//!
//! ## Features
//!
//! - Four module styles: square, rounded, dot and liquid.
//! - Solid or canvas-wide linear gradient fills, custom background colors.
//! - Centered logo on a rounded backing patch.
//! - Four error correction levels: Low, Medium, Quartile, High.
//! - Render pipeline that discards stale completions and notifies listeners.
//! - Dynamic codes with short aliases, scan counting and `/r/{code}` redirect resolution.
//! - PNG, `data:` URL and console output.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrcanvas = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Render a dotted QR code with a gradient:
//!
//! ```rust
//! use qrcanvas::{ModuleStyle, RenderConfig, RenderPipeline};
//!
//! let config = RenderConfig {
//!     module_style: ModuleStyle::Dot,
//!     gradient_enabled: true,
//!     ..RenderConfig::default().with_payload("Hello, World!")
//! };
//! let mut pipeline = RenderPipeline::new();
//! let artifact = pipeline.render(&config).unwrap();
//! assert_eq!(artifact.canvas().dimensions(), (300, 300));
//! ```
//!
//! Register a dynamic code and resolve a scan of it:
//!
//! ```rust
//! use qrcanvas::redirect::{resolve, RedirectOutcome};
//! use qrcanvas::{DynamicCodes, MemoryStore, RenderConfig};
//!
//! let codes = DynamicCodes::new(MemoryStore::new(), "https://qr.example");
//! let record = codes.create("example.org", &RenderConfig::default()).unwrap();
//! let path = format!("/r/{}", record.short_code);
//! let outcome = resolve(codes.store(), &path, "Mozilla/5.0").unwrap();
//! assert_eq!(outcome, RedirectOutcome::Navigate { target_url: "https://example.org".into() });
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Render configuration, colors and JSON loading.
//! - [`encoder`]: Payload to raster encoding.
//! - [`geometry`]: Module grid recovery from a raster.
//! - [`paint`]: Anti-aliased shape filling.
//! - [`style`]: Module restyling.
//! - [`logo`]: Logo compositing.
//! - [`pipeline`]: Render orchestration.
//! - [`helper`]: PNG export and console output.
//! - [`store`], [`dynamic`], [`redirect`]: Dynamic codes.

pub mod config;
pub mod dynamic;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod helper;
pub mod logo;
pub mod paint;
pub mod pipeline;
pub mod redirect;
pub mod store;
pub mod style;

pub use config::{Color, EccLevel, LogoConfig, ModuleStyle, PixelSize, RenderConfig};
pub use dynamic::DynamicCodes;
pub use error::{ConfigError, PersistenceError, RenderError, RenderFailed};
pub use pipeline::{RenderPipeline, RenderedArtifact};
pub use store::{DynamicCodeRecord, DynamicCodeStore, MemoryStore};
