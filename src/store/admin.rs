//! Administrative, tenant-scoped bulk read for external sync consumers.

use serde::{Deserialize, Serialize};

use crate::catalog::{self, SeriesCatalog};
use crate::error::{SeriesError, SeriesResult};
use crate::identity::SecurityContext;
use crate::security::GLOBAL_ADMIN_ROLE;

use super::{report, SeriesDatabase, SeriesRecord};

/// Flat row handed to sync consumers. Tombstoned rows keep their deletion
/// stamp so remote ends can mirror deletions during incremental sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub id: String,
    pub organization: String,
    pub dublin_core: SeriesCatalog,
    /// Raw ACL text as stored; `None` means unrestricted.
    pub access_control: Option<String>,
    pub modified_ms: i64,
    pub deleted_ms: Option<i64>,
}

impl SeriesDatabase {
    /// Time-windowed read of every record in the caller's tenant, tombstones
    /// included, ordered by modification time (series id as tie-break) and
    /// capped at `limit` rows.
    ///
    /// Gated by a coarse role check: the caller must hold the global admin
    /// role or the tenant's own admin role. Per-record ACLs do not apply here.
    pub fn get_all_for_administrative_read(
        &self,
        ctx: &SecurityContext,
        from_ms: i64,
        to_ms: Option<i64>,
        limit: usize,
    ) -> SeriesResult<Vec<Series>> {
        if limit == 0 {
            return Err(SeriesError::invalid("limit_out_of_range", "limit has to be > 0"));
        }
        if !ctx.user.has_role(GLOBAL_ADMIN_ROLE) && !ctx.user.has_role(&ctx.organization.admin_role)
        {
            return Err(SeriesError::unauthorized(
                "admin_role_required",
                format!("{} may not perform administrative reads", ctx.user.username),
            ));
        }
        if let Some(to) = to_ms {
            if from_ms > to {
                return Err(SeriesError::invalid("range_inverted", "`from` is after `to`"));
            }
        }

        let mut rows: Vec<SeriesRecord> = self
            .records
            .read()
            .values()
            .filter(|r| r.organization == ctx.organization.id)
            .filter(|r| r.modified_ms >= from_ms && to_ms.map_or(true, |to| r.modified_ms <= to))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.modified_ms, a.series_id.as_str()).cmp(&(b.modified_ms, b.series_id.as_str()))
        });
        rows.truncate(limit);

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            let dublin_core = catalog::parse_catalog(&r.dublin_core)
                .map_err(|e| report("get_all_for_administrative_read", &r.series_id, e))?;
            out.push(Series {
                id: r.series_id,
                organization: r.organization,
                dublin_core,
                access_control: r.access_control,
                modified_ms: r.modified_ms,
                deleted_ms: r.deleted_ms,
            });
        }
        Ok(out)
    }
}
