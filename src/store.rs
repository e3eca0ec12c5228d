//! Persistence collaborator for dynamic codes.
//!
//! The renderer's host talks to storage only through [`DynamicCodeStore`].
//! Handles are constructed explicitly and passed in; [`MemoryStore`] is the
//! in-memory implementation used by tests and single-process hosts.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::debug;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RenderConfig;
use crate::error::PersistenceError;

/// Length of generated short codes.
pub const SHORT_CODE_LEN: usize = 6;

/// A registered dynamic code.
///
/// `short_code` and `render_config` never change after creation, so the
/// rendered glyph stays stable while `target_url` is edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicCodeRecord {
    pub id: Uuid,
    pub short_code: String,
    pub target_url: String,
    pub render_config: RenderConfig,
    pub scan_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One resolved scan of a dynamic code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub id: Uuid,
    pub record_id: Uuid,
    pub user_agent: String,
    pub scanned_at: DateTime<Utc>,
}

/// Storage operations the dynamic-code host needs.
pub trait DynamicCodeStore {
    /// Creates a record with a fresh short code and a zero scan count.
    fn create(
        &self,
        target_url: &str,
        render_config: &RenderConfig,
    ) -> Result<DynamicCodeRecord, PersistenceError>;

    /// All records, newest first.
    fn list(&self) -> Result<Vec<DynamicCodeRecord>, PersistenceError>;

    /// Returns [`PersistenceError::NotFound`] for unknown codes.
    fn get_by_short_code(&self, short_code: &str) -> Result<DynamicCodeRecord, PersistenceError>;

    /// Replaces the target URL and bumps `updated_at`; nothing else changes.
    fn update_target_url(&self, id: Uuid, target_url: &str) -> Result<(), PersistenceError>;

    fn delete(&self, id: Uuid) -> Result<(), PersistenceError>;

    /// Increments the scan counter and appends a [`ScanEvent`]. Unknown codes
    /// are ignored.
    fn record_scan(&self, short_code: &str, user_agent: &str) -> Result<(), PersistenceError>;

    /// Scan log of one record, oldest first.
    fn scans(&self, id: Uuid) -> Result<Vec<ScanEvent>, PersistenceError>;
}

impl<S: DynamicCodeStore + ?Sized> DynamicCodeStore for &S {
    fn create(
        &self,
        target_url: &str,
        render_config: &RenderConfig,
    ) -> Result<DynamicCodeRecord, PersistenceError> {
        (**self).create(target_url, render_config)
    }

    fn list(&self) -> Result<Vec<DynamicCodeRecord>, PersistenceError> {
        (**self).list()
    }

    fn get_by_short_code(&self, short_code: &str) -> Result<DynamicCodeRecord, PersistenceError> {
        (**self).get_by_short_code(short_code)
    }

    fn update_target_url(&self, id: Uuid, target_url: &str) -> Result<(), PersistenceError> {
        (**self).update_target_url(id, target_url)
    }

    fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        (**self).delete(id)
    }

    fn record_scan(&self, short_code: &str, user_agent: &str) -> Result<(), PersistenceError> {
        (**self).record_scan(short_code, user_agent)
    }

    fn scans(&self, id: Uuid) -> Result<Vec<ScanEvent>, PersistenceError> {
        (**self).scans(id)
    }
}

/// A random code of [`SHORT_CODE_LEN`] characters from `[A-Za-z0-9]`.
pub fn generate_short_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Whether `code` is a well-formed short code: one or more ASCII alphanumerics.
pub fn is_short_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Debug, Default)]
struct Tables {
    records: Vec<DynamicCodeRecord>,
    scans: Vec<ScanEvent>,
}

/// In-memory [`DynamicCodeStore`]. Clones share the same tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

fn poisoned<T>(_: T) -> PersistenceError {
    PersistenceError::Backend("store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DynamicCodeStore for MemoryStore {
    fn create(
        &self,
        target_url: &str,
        render_config: &RenderConfig,
    ) -> Result<DynamicCodeRecord, PersistenceError> {
        let mut tables = self.tables.lock().map_err(poisoned)?;
        let short_code = loop {
            let candidate = generate_short_code();
            if !tables.records.iter().any(|r| r.short_code == candidate) {
                break candidate;
            }
        };
        let now = Utc::now();
        let record = DynamicCodeRecord {
            id: Uuid::new_v4(),
            short_code,
            target_url: target_url.to_string(),
            render_config: render_config.clone(),
            scan_count: 0,
            created_at: now,
            updated_at: now,
        };
        debug!("created dynamic code {} -> {}", record.short_code, record.target_url);
        tables.records.push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<DynamicCodeRecord>, PersistenceError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(tables.records.iter().rev().cloned().collect())
    }

    fn get_by_short_code(&self, short_code: &str) -> Result<DynamicCodeRecord, PersistenceError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        tables
            .records
            .iter()
            .find(|r| r.short_code == short_code)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(short_code.to_string()))
    }

    fn update_target_url(&self, id: Uuid, target_url: &str) -> Result<(), PersistenceError> {
        let mut tables = self.tables.lock().map_err(poisoned)?;
        let record = tables
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        record.target_url = target_url.to_string();
        record.updated_at = Utc::now();
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        let mut tables = self.tables.lock().map_err(poisoned)?;
        let before = tables.records.len();
        tables.records.retain(|r| r.id != id);
        if tables.records.len() == before {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        tables.scans.retain(|s| s.record_id != id);
        Ok(())
    }

    fn record_scan(&self, short_code: &str, user_agent: &str) -> Result<(), PersistenceError> {
        let mut tables = self.tables.lock().map_err(poisoned)?;
        let Some(record) = tables.records.iter_mut().find(|r| r.short_code == short_code) else {
            return Ok(());
        };
        record.scan_count += 1;
        let record_id = record.id;
        tables.scans.push(ScanEvent {
            id: Uuid::new_v4(),
            record_id,
            user_agent: user_agent.to_string(),
            scanned_at: Utc::now(),
        });
        Ok(())
    }

    fn scans(&self, id: Uuid) -> Result<Vec<ScanEvent>, PersistenceError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(tables.scans.iter().filter(|s| s.record_id == id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_code_shape() {
        for _ in 0..50 {
            let code = generate_short_code();
            assert_eq!(code.len(), SHORT_CODE_LEN);
            assert!(is_short_code(&code), "{code}");
        }
        assert!(!is_short_code(""));
        assert!(!is_short_code("ab-12"));
        assert!(!is_short_code("ab/12"));
    }

    #[test]
    fn test_create_and_lookup() {
        let store = MemoryStore::new();
        let record = store.create("https://example.com", &RenderConfig::default()).unwrap();
        assert_eq!(record.scan_count, 0);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(store.get_by_short_code(&record.short_code).unwrap(), record);
        assert_eq!(
            store.get_by_short_code("doesNotExist").unwrap_err(),
            PersistenceError::NotFound("doesNotExist".into())
        );
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = MemoryStore::new();
        let first = store.create("https://a.example", &RenderConfig::default()).unwrap();
        let second = store.create("https://b.example", &RenderConfig::default()).unwrap();
        let listed: Vec<Uuid> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[test]
    fn test_update_touches_only_target_and_timestamp() {
        let store = MemoryStore::new();
        let frozen = RenderConfig::default().with_payload("frozen");
        let record = store.create("https://a.example", &frozen).unwrap();
        store.update_target_url(record.id, "https://b.example").unwrap();
        let updated = store.get_by_short_code(&record.short_code).unwrap();
        assert_eq!(updated.target_url, "https://b.example");
        assert!(updated.updated_at >= record.updated_at);
        assert_eq!(updated.render_config, record.render_config);
        assert_eq!(updated.short_code, record.short_code);
        assert_eq!(updated.created_at, record.created_at);
        assert!(store.update_target_url(Uuid::new_v4(), "https://c.example").is_err());
    }

    #[test]
    fn test_record_scan_counts_and_logs() {
        let store = MemoryStore::new();
        let record = store.create("https://a.example", &RenderConfig::default()).unwrap();
        store.record_scan(&record.short_code, "Mozilla/5.0").unwrap();
        store.record_scan(&record.short_code, "curl/8.0").unwrap();
        store.record_scan("unknown", "curl/8.0").unwrap();

        assert_eq!(store.get_by_short_code(&record.short_code).unwrap().scan_count, 2);
        let agents: Vec<String> =
            store.scans(record.id).unwrap().into_iter().map(|s| s.user_agent).collect();
        assert_eq!(agents, vec!["Mozilla/5.0", "curl/8.0"]);
    }

    #[test]
    fn test_delete_removes_record_and_scans() {
        let store = MemoryStore::new();
        let record = store.create("https://a.example", &RenderConfig::default()).unwrap();
        store.record_scan(&record.short_code, "ua").unwrap();
        store.delete(record.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.scans(record.id).unwrap().is_empty());
        assert!(matches!(store.delete(record.id), Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_clones_share_tables() {
        let store = MemoryStore::new();
        let handle = store.clone();
        let record = handle.create("https://a.example", &RenderConfig::default()).unwrap();
        assert_eq!(store.get_by_short_code(&record.short_code).unwrap().id, record.id);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let store = MemoryStore::new();
        let record = store.create("https://a.example", &RenderConfig::default()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["shortCode"], record.short_code.as_str());
        assert_eq!(json["renderConfig"]["moduleStyle"], "square");
    }
}
