//! # Actors and Permissions
//!
//! An actor is the resolved identity a request acts as: its permission set
//! (already flattened through roles), its home institution, and whether it
//! is a superuser. Permission names are data, not code - the authorization
//! tables reference them by string.

use crate::ids::{InstansiId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Well-known permission names.
///
/// Roles resolve to sets of these at login; the engine only ever sees the
/// flattened set.
pub mod perm {
    /// Unrestricted within the module; bypasses deadline windows.
    pub const ADMIN: &str = "sakip.admin";
    /// Institution leadership: approves targets, reviews assessments.
    pub const PIMPINAN: &str = "sakip.pimpinan";
    /// Evaluator: creates and completes assessments.
    pub const ASSESSOR: &str = "sakip.assessor";
    /// Auditor: moves validated records to audited.
    pub const AUDITOR: &str = "sakip.auditor";
    /// Data entry: creates and submits performance data and evidence.
    pub const DATA_SUBMIT: &str = "sakip.data.submit";
    /// Verifier: validates or rejects submitted data and evidence.
    pub const DATA_VALIDATE: &str = "sakip.data.validate";
    /// Target drafting and submission.
    pub const TARGET_SUBMIT: &str = "sakip.targets.submit";
    /// User administration.
    pub const USER_DELETE: &str = "admin.users.delete";
    /// Permanent user removal.
    pub const USER_FORCE_DELETE: &str = "admin.users.force-delete";
    /// Acting as another user.
    pub const USER_IMPERSONATE: &str = "admin.users.impersonate";
}

/// The resolved identity performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user.
    pub user: UserId,
    /// Home institution; `None` only for superusers.
    pub instansi: Option<InstansiId>,
    /// Flattened permission set (roles already resolved).
    pub permissions: BTreeSet<String>,
    /// Superusers bypass every rule except the self-action guards.
    pub superuser: bool,
}

impl Actor {
    /// A regular institution-scoped actor with the given permissions.
    #[must_use]
    pub fn new<I, S>(user: UserId, instansi: InstansiId, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user,
            instansi: Some(instansi),
            permissions: permissions.into_iter().map(Into::into).collect(),
            superuser: false,
        }
    }

    /// A superuser; home institution is optional.
    #[must_use]
    pub fn superuser(user: UserId) -> Self {
        Self {
            user,
            instansi: None,
            permissions: BTreeSet::new(),
            superuser: true,
        }
    }

    /// Whether the actor holds a specific permission.
    #[must_use]
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    /// Whether the actor holds at least one of the named permissions.
    #[must_use]
    pub fn has_any_permission(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.permissions.contains(*name))
    }

    /// Whether the actor belongs to the given institution.
    #[must_use]
    pub fn belongs_to(&self, instansi: InstansiId) -> bool {
        self.instansi == Some(instansi)
    }

    /// Deadline windows do not apply to superusers or module admins.
    #[must_use]
    pub fn bypasses_deadlines(&self) -> bool {
        self.superuser || self.has_permission(perm::ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_lookup() {
        let actor = Actor::new(UserId(1), InstansiId(10), [perm::ASSESSOR]);
        assert!(actor.has_permission(perm::ASSESSOR));
        assert!(!actor.has_permission(perm::ADMIN));
        assert!(actor.has_any_permission(&[perm::ADMIN, perm::ASSESSOR]));
        assert!(!actor.has_any_permission(&[perm::ADMIN, perm::AUDITOR]));
    }

    #[test]
    fn institution_membership() {
        let actor = Actor::new(UserId(1), InstansiId(10), [perm::DATA_SUBMIT]);
        assert!(actor.belongs_to(InstansiId(10)));
        assert!(!actor.belongs_to(InstansiId(11)));

        let root = Actor::superuser(UserId(2));
        assert!(!root.belongs_to(InstansiId(10)));
    }

    #[test]
    fn deadline_bypass() {
        assert!(Actor::superuser(UserId(1)).bypasses_deadlines());
        let admin = Actor::new(UserId(2), InstansiId(1), [perm::ADMIN]);
        assert!(admin.bypasses_deadlines());
        let clerk = Actor::new(UserId(3), InstansiId(1), [perm::DATA_SUBMIT]);
        assert!(!clerk.bypasses_deadlines());
    }
}
