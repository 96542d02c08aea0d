//! Snapshot persistence for the series record map.
//! One bincode file under the root holds every record; writes go through a
//! temp file and a rename so a crash never leaves a half-written snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SeriesKey, SeriesRecord, StoreSettings};

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    created_ms: i64,
    records: Vec<SeriesRecord>,
}

pub(crate) fn settings_path(root: &Path) -> PathBuf {
    root.join("store.json")
}

pub(crate) fn snapshot_path(root: &Path) -> PathBuf {
    root.join("snapshot.bin")
}

/// Load settings from `<root>/store.json`, falling back to defaults.
pub(crate) fn load_settings(root: &Path, name: &str) -> StoreSettings {
    let mut settings = StoreSettings::default();
    settings.name = name.to_string();
    if let Ok(bytes) = std::fs::read(settings_path(root)) {
        if let Ok(mut s) = serde_json::from_slice::<StoreSettings>(&bytes) {
            if s.name.is_empty() {
                s.name = name.to_string();
            }
            settings = s;
        }
    }
    settings
}

pub(crate) fn save_settings(root: &Path, settings: &StoreSettings) -> Result<()> {
    std::fs::write(settings_path(root), serde_json::to_vec_pretty(settings)?)?;
    Ok(())
}

pub(crate) fn load_snapshot(root: &Path) -> Result<HashMap<SeriesKey, SeriesRecord>> {
    let path = snapshot_path(root);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let bytes = std::fs::read(&path)?;
    let snap: Snapshot = bincode::deserialize(&bytes)?;
    let mut map = HashMap::with_capacity(snap.records.len());
    for r in snap.records {
        let key = SeriesKey { organization: r.organization.clone(), series_id: r.series_id.clone() };
        map.insert(key, r);
    }
    debug!(
        target: "seriesdb::store",
        "load_snapshot: {} records from '{}'",
        map.len(),
        path.display()
    );
    Ok(map)
}

pub(crate) fn save_snapshot(root: &Path, records: &HashMap<SeriesKey, SeriesRecord>) -> Result<()> {
    let snap = Snapshot {
        version: 1,
        created_ms: super::now_ms(),
        records: records.values().cloned().collect(),
    };
    let bytes = bincode::serialize(&snap)?;
    let tmp = snapshot_path(root).with_extension("bin.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(tmp, snapshot_path(root))?;
    Ok(())
}
