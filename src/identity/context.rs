use super::{Organization, User};

/// Identity and tenant scope for a single store call.
///
/// The context is re-supplied on every call rather than held as process-global
/// state, so concurrent callers with different identities never observe each
/// other's scope.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    pub user: User,
    pub organization: Organization,
}

impl SecurityContext {
    pub fn new(user: User, organization: Organization) -> Self {
        Self { user, organization }
    }
}
