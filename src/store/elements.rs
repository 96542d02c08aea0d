//! Per-series binary elements, nested inside the entity store.
//!
//! Element operations carry no per-record authorization; callers are trusted
//! internal pipelines. A missing record signals `false`/`None` instead of an
//! error so bulk ingestion can skip absent series without aborting.

use std::collections::HashMap;

use crate::error::SeriesResult;
use crate::identity::SecurityContext;

use super::{now_ms, SeriesDatabase};

impl SeriesDatabase {
    /// Upsert one element. Returns `false` without error when the series does
    /// not exist (or is tombstoned).
    pub fn store_series_element(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        element_type: &str,
        data: &[u8],
    ) -> SeriesResult<bool> {
        let Some(mut record) = self.live_record(ctx, series_id) else {
            return Ok(false);
        };
        record.elements.insert(element_type.to_string(), data.to_vec());
        record.modified_ms = now_ms();
        self.commit(self.key(ctx, series_id), record)?;
        Ok(true)
    }

    /// Remove one element. `false` when the series or the type is absent.
    pub fn delete_series_element(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        element_type: &str,
    ) -> SeriesResult<bool> {
        let Some(mut record) = self.live_record(ctx, series_id) else {
            return Ok(false);
        };
        if record.elements.remove(element_type).is_none() {
            return Ok(false);
        }
        record.modified_ms = now_ms();
        self.commit(self.key(ctx, series_id), record)?;
        Ok(true)
    }

    pub fn get_series_element(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        element_type: &str,
    ) -> SeriesResult<Option<Vec<u8>>> {
        Ok(self
            .live_record(ctx, series_id)
            .and_then(|r| r.elements.get(element_type).cloned()))
    }

    pub fn get_series_elements(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
    ) -> SeriesResult<Option<HashMap<String, Vec<u8>>>> {
        Ok(self.live_record(ctx, series_id).map(|r| r.elements))
    }

    pub fn series_element_exists(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        element_type: &str,
    ) -> SeriesResult<bool> {
        Ok(self.get_series_element(ctx, series_id, element_type)?.is_some())
    }
}
