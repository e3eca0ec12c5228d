//! Dynamic codes: a short alias is rendered once, its destination stays editable.
//!
//! The glyph encodes `{base_url}/r/{short_code}`. Because neither the short
//! code nor the stored render config change after creation, re-rendering a
//! record always yields the same image no matter how often its target moves.
//!
//! ```rust
//! use qrcanvas::config::RenderConfig;
//! use qrcanvas::dynamic::DynamicCodes;
//! use qrcanvas::store::MemoryStore;
//!
//! let codes = DynamicCodes::new(MemoryStore::new(), "https://qr.example");
//! let record = codes.create("example.org/menu", &RenderConfig::default()).unwrap();
//! assert_eq!(record.target_url, "https://example.org/menu");
//! assert_eq!(codes.alias_url(&record), format!("https://qr.example/r/{}", record.short_code));
//! ```

use log::info;
use uuid::Uuid;

use crate::config::RenderConfig;
use crate::error::PersistenceError;
use crate::helper::ExportName;
use crate::redirect::ALIAS_PREFIX;
use crate::store::{DynamicCodeRecord, DynamicCodeStore};

/// Trims `input` and prepends `https://` unless it already starts with
/// `http://` or `https://` (any case).
///
/// # Errors
///
/// Returns [`PersistenceError::Validation`] for an empty or blank target.
///
/// # Example
///
/// ```rust
/// use qrcanvas::dynamic::normalize_target_url;
///
/// assert_eq!(normalize_target_url(" example.com ").unwrap(), "https://example.com");
/// assert_eq!(normalize_target_url("HTTP://example.com").unwrap(), "HTTP://example.com");
/// assert!(normalize_target_url("   ").is_err());
/// ```
pub fn normalize_target_url(input: &str) -> Result<String, PersistenceError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::Validation("target URL is empty".to_string()));
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

/// `{base_url}/r/{short_code}`, tolerating a trailing slash on the base.
pub fn alias_url(base_url: &str, short_code: &str) -> String {
    format!("{}{ALIAS_PREFIX}{short_code}", base_url.trim_end_matches('/'))
}

/// Create/list/update/delete over an injected [`DynamicCodeStore`].
#[derive(Clone, Debug)]
pub struct DynamicCodes<S> {
    store: S,
    base_url: String,
}

impl<S: DynamicCodeStore> DynamicCodes<S> {
    pub fn new(store: S, base_url: impl Into<String>) -> Self {
        Self { store, base_url: base_url.into() }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new dynamic code pointing at `target`.
    ///
    /// The target is normalized first; `render_config` is stored as the
    /// frozen glyph style.
    pub fn create(
        &self,
        target: &str,
        render_config: &RenderConfig,
    ) -> Result<DynamicCodeRecord, PersistenceError> {
        let target_url = normalize_target_url(target)?;
        let record = self.store.create(&target_url, render_config)?;
        info!("registered dynamic code {} for {}", record.short_code, record.target_url);
        Ok(record)
    }

    /// All records, newest first.
    pub fn list(&self) -> Result<Vec<DynamicCodeRecord>, PersistenceError> {
        self.store.list()
    }

    /// Points an existing record at a new target. The glyph is unaffected.
    pub fn update_target(&self, id: Uuid, target: &str) -> Result<(), PersistenceError> {
        let target_url = normalize_target_url(target)?;
        self.store.update_target_url(id, &target_url)?;
        info!("dynamic code {id} now points at {target_url}");
        Ok(())
    }

    pub fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        self.store.delete(id)
    }

    pub fn alias_url(&self, record: &DynamicCodeRecord) -> String {
        alias_url(&self.base_url, &record.short_code)
    }

    /// The config to render a record's glyph: its stored style with the
    /// alias URL as payload.
    pub fn glyph_config(&self, record: &DynamicCodeRecord) -> RenderConfig {
        record.render_config.clone().with_payload(self.alias_url(record))
    }

    /// Exported files of dynamic codes are named after the short code.
    pub fn export_name(&self, record: &DynamicCodeRecord) -> ExportName {
        ExportName::ShortCode(record.short_code.clone())
    }
}
