//!
//! seriesdb store module
//! ---------------------
//! This module implements the persistence-and-authorization engine for series
//! records. A `SeriesDatabase` holds one record map keyed by
//! `(organization, series_id)` and persists it as a single bincode snapshot
//! under its root folder. Every public operation is self-contained: it loads
//! the record, consults the authorization evaluator, mutates a staged copy and
//! commits map-write plus snapshot flush together, so a failed operation never
//! leaves a partial change behind.
//!
//! Key responsibilities:
//! - Entity lifecycle: create, update, soft-delete and tombstone reclaim.
//! - Per-action ACL enforcement on reads and writes of the catalog, the
//!   policy itself and the property map.
//! - Nested property (string) and element (binary) sub-stores.
//! - The administrative, tenant-scoped range read used by sync clients.
//!
//! The load/check/commit sequence is intentionally not serialized against
//! concurrent writers of the same record; last writer wins within a single
//! map insert, bounded by the snapshot flush under the write lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub mod admin;
pub mod elements;
pub mod properties;
mod snapshot;

use crate::acl::{self, AccessControlList};
use crate::catalog::{self, SeriesCatalog};
use crate::error::{SeriesError, SeriesResult};
use crate::identity::SecurityContext;
use crate::security;

pub use admin::Series;

/// Uniqueness key for a record: series ids are scoped per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub organization: String,
    pub series_id: String,
}

/// The stored entity. `deleted_ms` present marks the record as tombstoned:
/// logically absent from every normal path, physically retained until a
/// subsequent create for the same key reclaims it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesRecord {
    pub series_id: String,
    pub organization: String,
    /// Serialized metadata catalog, opaque to the store.
    pub dublin_core: String,
    /// Serialized ACL; `None` means unrestricted.
    pub access_control: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub elements: HashMap<String, Vec<u8>>,
    /// Epoch milliseconds, advanced on every mutation including delete.
    pub modified_ms: i64,
    pub deleted_ms: Option<i64>,
}

impl SeriesRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_ms.is_some()
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct StoreSettings {
    /// Display name of the store, defaults to the root folder name.
    #[serde(default)]
    pub name: String,
    /// If true, every committed mutation rewrites the on-disk snapshot.
    /// Tests may turn this off via `<root>/store.json` for speed.
    #[serde(default = "StoreSettings::default_flush")]
    pub flush_on_commit: bool,
}

impl StoreSettings {
    fn default_flush() -> bool {
        true
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { name: String::new(), flush_on_commit: true }
    }
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Log infrastructure failures (corrupt ACL text, codec or snapshot faults)
/// with operation and series context before propagating.
pub(crate) fn report(op: &str, series_id: &str, err: SeriesError) -> SeriesError {
    error!(target: "seriesdb::store", "{}: series '{}': {}", op, series_id, err);
    err
}

/// Permanent storage for series records, their access control policy,
/// properties and binary elements.
pub struct SeriesDatabase {
    root: PathBuf,
    settings: StoreSettings,
    records: RwLock<HashMap<SeriesKey, SeriesRecord>>,
}

static DATABASES: Lazy<RwLock<HashMap<PathBuf, Arc<SeriesDatabase>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Process-wide handle cache: one database instance per root directory.
pub fn database_for_root(root: impl AsRef<Path>) -> SeriesResult<Arc<SeriesDatabase>> {
    let key = root.as_ref().to_path_buf();
    // Fast path read
    if let Some(db) = DATABASES.read().get(&key).cloned() {
        return Ok(db);
    }
    let db = Arc::new(SeriesDatabase::open(&key)?);
    let mut w = DATABASES.write();
    if let Some(existing) = w.get(&key) {
        return Ok(existing.clone());
    }
    w.insert(key, db.clone());
    Ok(db)
}

impl SeriesDatabase {
    /// Open (or create) a database rooted at the given folder, loading the
    /// settings file and the snapshot when present.
    pub fn open(root: impl AsRef<Path>) -> SeriesResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| SeriesError::storage("snapshot_io", e.to_string()))?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "seriesdb".to_string());
        let settings = snapshot::load_settings(&root, &name);
        if !snapshot::settings_path(&root).exists() {
            if let Err(e) = snapshot::save_settings(&root, &settings) {
                debug!(target: "seriesdb::store", "open: could not seed store.json: {}", e);
            }
        }
        let records = snapshot::load_snapshot(&root).map_err(|e| {
            error!(target: "seriesdb::store", "open: could not load snapshot under '{}': {}", root.display(), e);
            SeriesError::storage("snapshot_io", e.to_string())
        })?;
        debug!(
            target: "seriesdb::store",
            "open: root='{}' name='{}' records={}",
            root.display(),
            settings.name,
            records.len()
        );
        Ok(Self { root, settings, records: RwLock::new(records) })
    }

    pub fn root_path(&self) -> &PathBuf {
        &self.root
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    fn key(&self, ctx: &SecurityContext, series_id: &str) -> SeriesKey {
        SeriesKey { organization: ctx.organization.id.clone(), series_id: series_id.to_string() }
    }

    /// Load the live record for the caller's tenant; tombstones read as absent.
    pub(crate) fn live_record(&self, ctx: &SecurityContext, series_id: &str) -> Option<SeriesRecord> {
        self.records
            .read()
            .get(&self.key(ctx, series_id))
            .filter(|r| !r.is_deleted())
            .cloned()
    }

    fn potentially_deleted_record(&self, ctx: &SecurityContext, series_id: &str) -> Option<SeriesRecord> {
        self.records.read().get(&self.key(ctx, series_id)).cloned()
    }

    /// Commit one record mutation: insert into the map and flush the snapshot.
    /// A failed flush restores the prior in-memory state so map and disk stay
    /// consistent.
    pub(crate) fn commit(&self, key: SeriesKey, record: SeriesRecord) -> SeriesResult<()> {
        let mut w = self.records.write();
        let prior = w.insert(key.clone(), record);
        if self.settings.flush_on_commit {
            if let Err(e) = snapshot::save_snapshot(&self.root, &w) {
                match prior {
                    Some(p) => {
                        w.insert(key, p);
                    }
                    None => {
                        w.remove(&key);
                    }
                }
                error!(target: "seriesdb::store", "commit: snapshot flush failed: {}", e);
                return Err(SeriesError::storage("snapshot_io", e.to_string()));
            }
        }
        Ok(())
    }

    /// Flush the current map to disk regardless of `flush_on_commit`.
    pub fn flush(&self) -> SeriesResult<()> {
        snapshot::save_snapshot(&self.root, &self.records.read())
            .map_err(|e| SeriesError::storage("snapshot_io", e.to_string()))
    }

    /// Fetch the decoded catalog of a live series. Read access requires any of
    /// read, contribute or write on the record's policy; capture agents are
    /// always allowed.
    pub fn get_series(&self, ctx: &SecurityContext, series_id: &str) -> SeriesResult<SeriesCatalog> {
        let record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found("no_such_series", format!("no series with id={} exists", series_id))
        })?;
        let readable = security::user_has_read_access(ctx, record.access_control.as_deref())
            .map_err(|e| report("get_series", series_id, e))?;
        if !readable {
            return Err(SeriesError::unauthorized(
                "read_denied",
                format!("{} is not authorized to see series {}", ctx.user.username, series_id),
            ));
        }
        catalog::parse_catalog(&record.dublin_core).map_err(|e| report("get_series", series_id, e))
    }

    /// Store a series catalog under its identifier.
    ///
    /// An absent or tombstoned key creates a fresh record: the tombstone, if
    /// any, is purged in the same commit and none of its policy, properties or
    /// elements carry forward. A live key is overwritten after the write-class
    /// check against its current policy.
    ///
    /// Returns the catalog back when a new record was created and `None` when
    /// an existing one was updated, so callers can tell the outcomes apart.
    pub fn store_series(
        &self,
        ctx: &SecurityContext,
        series: &SeriesCatalog,
    ) -> SeriesResult<Option<SeriesCatalog>> {
        if series.identifier.trim().is_empty() {
            return Err(SeriesError::invalid(
                "blank_identifier",
                "series catalog carries no identifier",
            ));
        }
        let serialized = catalog::serialize_catalog(series)
            .map_err(|e| report("store_series", &series.identifier, e))?;
        let key = self.key(ctx, &series.identifier);
        let existing = self.potentially_deleted_record(ctx, &series.identifier);
        let now = now_ms();
        match existing {
            Some(mut record) if !record.is_deleted() => {
                let writable = security::user_has_write_access(ctx, record.access_control.as_deref())
                    .map_err(|e| report("store_series", &series.identifier, e))?;
                if !writable {
                    return Err(SeriesError::unauthorized(
                        "write_denied",
                        format!(
                            "{} is not authorized to update series {}",
                            ctx.user.username, series.identifier
                        ),
                    ));
                }
                record.dublin_core = serialized;
                record.modified_ms = now;
                self.commit(key, record)?;
                Ok(None)
            }
            existing => {
                if existing.is_some() {
                    // Reclaim: the tombstone is superseded in the same commit,
                    // so no caller can observe the key as absent in between.
                    debug!(
                        target: "seriesdb::store",
                        "store_series: reclaiming tombstone for series '{}'",
                        series.identifier
                    );
                }
                let record = SeriesRecord {
                    series_id: series.identifier.clone(),
                    organization: ctx.organization.id.clone(),
                    dublin_core: serialized,
                    access_control: None,
                    properties: HashMap::new(),
                    elements: HashMap::new(),
                    modified_ms: now,
                    deleted_ms: None,
                };
                self.commit(key, record)?;
                Ok(Some(series.clone()))
            }
        }
    }

    /// Soft-delete: stamps the deletion date and keeps the row for sync
    /// visibility. The record disappears from every normal read path.
    pub fn delete_series(&self, ctx: &SecurityContext, series_id: &str) -> SeriesResult<()> {
        let mut record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found(
                "no_such_series",
                format!("series with id={} does not exist", series_id),
            )
        })?;
        let writable = security::user_has_write_access(ctx, record.access_control.as_deref())
            .map_err(|e| report("delete_series", series_id, e))?;
        if !writable {
            return Err(SeriesError::unauthorized(
                "write_denied",
                format!("{} is not authorized to delete series {}", ctx.user.username, series_id),
            ));
        }
        let now = now_ms();
        record.modified_ms = now;
        record.deleted_ms = Some(now);
        self.commit(self.key(ctx, series_id), record)
    }

    /// Return the parsed policy, or `None` when the series is unrestricted.
    /// Reading whether a policy exists is not itself gated.
    pub fn get_access_control_list(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
    ) -> SeriesResult<Option<AccessControlList>> {
        let record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found(
                "no_such_series",
                format!("could not find series with id={}", series_id),
            )
        })?;
        match record.access_control {
            None => Ok(None),
            Some(text) => acl::parse_acl(&text)
                .map(Some)
                .map_err(|e| report("get_access_control_list", series_id, e)),
        }
    }

    /// Install or replace the policy on a live series. Replacing runs the
    /// write-class check against the *prior* policy. Returns `true` when a
    /// prior policy was replaced and `false` when this installed the first.
    pub fn store_access_control_list(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        access_control: &AccessControlList,
    ) -> SeriesResult<bool> {
        let serialized = acl::serialize_acl(access_control)
            .map_err(|e| report("store_access_control_list", series_id, e))?;
        let mut record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found(
                "no_such_series",
                format!("series with id={} does not exist", series_id),
            )
        })?;
        let updated = record.access_control.is_some();
        if updated {
            let writable = security::user_has_write_access(ctx, record.access_control.as_deref())
                .map_err(|e| report("store_access_control_list", series_id, e))?;
            if !writable {
                return Err(SeriesError::unauthorized(
                    "write_denied",
                    format!(
                        "{} is not authorized to update ACLs on series {}",
                        ctx.user.username, series_id
                    ),
                ));
            }
        }
        record.access_control = Some(serialized);
        record.modified_ms = now_ms();
        self.commit(self.key(ctx, series_id), record)?;
        Ok(updated)
    }

    /// Total record count, tombstones included. Not gated.
    pub fn count_series(&self) -> usize {
        self.records.read().len()
    }

    /// Every record across all tenants, tombstones included, in key order.
    /// Privileged internal operation: callers must gate access at the boundary
    /// before exposing this anywhere.
    pub fn get_all_series(&self) -> Vec<SeriesRecord> {
        let mut out: Vec<SeriesRecord> = self.records.read().values().cloned().collect();
        out.sort_by(|a, b| {
            (a.organization.as_str(), a.series_id.as_str())
                .cmp(&(b.organization.as_str(), b.series_id.as_str()))
        });
        out
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
