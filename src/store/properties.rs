//! Per-series string properties, nested inside the entity store.
//! Property reads and writes run under the same ACL rules as the catalog
//! itself: read-class for gets, write-class for upserts and deletes.

use std::collections::HashMap;

use crate::error::{SeriesError, SeriesResult};
use crate::identity::SecurityContext;
use crate::security;

use super::{now_ms, report, SeriesDatabase};

impl SeriesDatabase {
    pub fn get_series_properties(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
    ) -> SeriesResult<HashMap<String, String>> {
        let record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found("no_such_series", format!("no series with id={} exists", series_id))
        })?;
        let readable = security::user_has_read_access(ctx, record.access_control.as_deref())
            .map_err(|e| report("get_series_properties", series_id, e))?;
        if !readable {
            return Err(SeriesError::unauthorized(
                "read_denied",
                format!(
                    "{} is not authorized to see series {} properties",
                    ctx.user.username, series_id
                ),
            ));
        }
        Ok(record.properties)
    }

    /// Blank values read as absent: a property set to whitespace is
    /// indistinguishable from one never set.
    pub fn get_series_property(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        property_name: &str,
    ) -> SeriesResult<String> {
        let record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found("no_such_series", format!("no series with id={} exists", series_id))
        })?;
        let readable = security::user_has_read_access(ctx, record.access_control.as_deref())
            .map_err(|e| report("get_series_property", series_id, e))?;
        if !readable {
            return Err(SeriesError::unauthorized(
                "read_denied",
                format!(
                    "{} is not authorized to see series {} properties",
                    ctx.user.username, series_id
                ),
            ));
        }
        match record.properties.get(property_name) {
            Some(value) if !value.trim().is_empty() => Ok(value.clone()),
            _ => Err(SeriesError::not_found(
                "no_such_property",
                format!(
                    "no series property for series with id={} and property name {}",
                    series_id, property_name
                ),
            )),
        }
    }

    pub fn update_series_property(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        property_name: &str,
        property_value: &str,
    ) -> SeriesResult<()> {
        let mut record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found("no_such_series", format!("series with id={} doesn't exist", series_id))
        })?;
        let writable = security::user_has_write_access(ctx, record.access_control.as_deref())
            .map_err(|e| report("update_series_property", series_id, e))?;
        if !writable {
            return Err(SeriesError::unauthorized(
                "write_denied",
                format!(
                    "{} is not authorized to update series {} property {}",
                    ctx.user.username, series_id, property_name
                ),
            ));
        }
        record.properties.insert(property_name.to_string(), property_value.to_string());
        record.modified_ms = now_ms();
        self.commit(self.key(ctx, series_id), record)
    }

    pub fn delete_series_property(
        &self,
        ctx: &SecurityContext,
        series_id: &str,
        property_name: &str,
    ) -> SeriesResult<()> {
        let mut record = self.live_record(ctx, series_id).ok_or_else(|| {
            SeriesError::not_found("no_such_series", format!("series with id={} does not exist", series_id))
        })?;
        if !record.properties.contains_key(property_name) {
            return Err(SeriesError::not_found(
                "no_such_property",
                format!(
                    "series with id={} doesn't have a property with name '{}'",
                    series_id, property_name
                ),
            ));
        }
        let writable = security::user_has_write_access(ctx, record.access_control.as_deref())
            .map_err(|e| report("delete_series_property", series_id, e))?;
        if !writable {
            return Err(SeriesError::unauthorized(
                "write_denied",
                format!(
                    "{} is not authorized to delete series {} property {}",
                    ctx.user.username, series_id, property_name
                ),
            ));
        }
        record.properties.remove(property_name);
        record.modified_ms = now_ms();
        self.commit(self.key(ctx, series_id), record)
    }
}
