//! Error types for rendering, persistence and configuration.

use thiserror::Error;

use crate::config::EccLevel;

/// Failures of a single render stage.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The payload does not fit any symbol version at the chosen level.
    #[error("payload cannot be encoded at error correction level {level:?}")]
    Encoding {
        level: EccLevel,
        #[source]
        source: qrcode::types::QrError,
    },

    /// The requested canvas cannot give every module at least one pixel.
    #[error("a {width}px canvas cannot hold {modules} modules plus a {margin}-module margin")]
    CanvasTooSmall { width: u32, modules: u32, margin: u32 },

    /// The raster could not be parsed into a module grid.
    #[error("module grid could not be recovered: {0}")]
    GeometryExtraction(String),

    /// The logo bytes could not be decoded. Never aborts a render.
    #[error("logo could not be decoded")]
    LogoLoad(#[source] image::ImageError),

    /// PNG encoding of the final canvas failed.
    #[error("PNG export failed")]
    Export(#[from] image::ImageError),

    /// A newer request was issued before this one completed.
    #[error("render was superseded by a newer request")]
    Superseded,
}

/// What the pipeline controller hands back when a render aborts.
///
/// The previously committed artifact stays in place.
#[derive(Error, Debug)]
#[error("render #{seq} failed")]
pub struct RenderFailed {
    pub seq: u64,
    #[source]
    pub reason: RenderError,
}

/// Failures reported by the persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("no dynamic code matches {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl PersistenceError {
    /// Backend failures are transient and the user may retry the action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PersistenceError::Backend(_))
    }
}

/// Errors from parsing colors or loading a render configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid color {0:?}, expected #rgb, #rrggbb, #rrggbbaa or transparent")]
    InvalidColor(String),

    #[error("unknown {kind} {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("failed to read config")]
    Io(#[from] std::io::Error),

    #[error("malformed config")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    /// Every message in the chain of `err`, outermost first.
    fn chain(err: &dyn std::error::Error) -> Vec<String> {
        let mut messages = vec![err.to_string()];
        let mut next = err.source();
        while let Some(cause) = next {
            messages.push(cause.to_string());
            next = cause.source();
        }
        messages
    }

    #[test]
    fn test_chain_prints_each_cause_once() {
        let image_err = image::load_from_memory(b"not an image").unwrap_err();
        let cause = image_err.to_string();
        let failed = RenderFailed { seq: 7, reason: RenderError::LogoLoad(image_err) };

        let messages = chain(&failed);
        assert_eq!(messages[0], "render #7 failed");
        assert_eq!(messages[1], "logo could not be decoded");
        assert_eq!(messages[2], cause);
        assert_eq!(messages.iter().filter(|m| m.contains(&cause)).count(), 1);
    }

    #[test]
    fn test_config_error_keeps_cause_in_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(json_err);
        assert_eq!(err.to_string(), "malformed config");
        assert!(err.source().is_some());
    }
}
