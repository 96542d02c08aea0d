//! Authorization evaluator: decides whether a caller may perform an action on
//! a record given the record's stored access control policy.

use crate::acl::{self, AccessControlList};
use crate::error::SeriesResult;
use crate::identity::{Organization, SecurityContext, User};

/// Role granting administrative access across all organizations.
pub const GLOBAL_ADMIN_ROLE: &str = "ROLE_ADMIN";

/// System role held by unattended recording devices. Holders bypass the
/// per-record check for read-class operations so they can always fetch the
/// series context they record against.
pub const GLOBAL_CAPTURE_AGENT_ROLE: &str = "ROLE_CAPTURE_AGENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Contribute,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Contribute => "contribute",
        }
    }
}

/// Pure evaluation over a parsed rule set: no side effects, no caching.
///
/// The global admin role and the organization's own admin role are always
/// authorized; otherwise the action must be granted by an allow entry whose
/// role the user holds.
pub fn is_authorized(acl: &AccessControlList, user: &User, org: &Organization, action: Action) -> bool {
    if user.has_role(GLOBAL_ADMIN_ROLE) || user.has_role(&org.admin_role) {
        return true;
    }
    acl.entries.iter().any(|e| {
        e.allow && e.action.eq_ignore_ascii_case(action.as_str()) && user.has_role(&e.role)
    })
}

/// Read-class gate over the serialized policy stored on a record.
///
/// An unset policy means unrestricted. Read, contribute and write all grant
/// read access: contributors and writers implicitly can read. Capture agents
/// are always allowed.
pub fn user_has_read_access(ctx: &SecurityContext, access_control: Option<&str>) -> SeriesResult<bool> {
    let Some(text) = access_control else { return Ok(true) };
    let parsed = acl::parse_acl(text)?;
    if ctx.user.has_role(GLOBAL_CAPTURE_AGENT_ROLE) {
        return Ok(true);
    }
    Ok([Action::Read, Action::Contribute, Action::Write]
        .iter()
        .any(|a| is_authorized(&parsed, &ctx.user, &ctx.organization, *a)))
}

/// Write-class gate over the serialized policy stored on a record.
/// Only an explicit write grant suffices; read/contribute do not.
pub fn user_has_write_access(ctx: &SecurityContext, access_control: Option<&str>) -> SeriesResult<bool> {
    let Some(text) = access_control else { return Ok(true) };
    let parsed = acl::parse_acl(text)?;
    Ok(is_authorized(&parsed, &ctx.user, &ctx.organization, Action::Write))
}
