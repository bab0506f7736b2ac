//! Teacher Account Linking & Role Assignments
//!
//! Associates a pending teacher invitation with an authenticated account
//! by case-insensitive email match, and grants the teacher role through a
//! keyed set insert so repeated invocations never produce duplicate rows.

use crate::model::UserId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Assignable role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Linked teacher account
    Teacher,
}

/// Teacher invitation record, created by an admin ahead of the teacher's
/// first sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherInvitation {
    /// Unique invitation ID
    pub id: Uuid,
    /// Email the invitation was issued to
    pub email: String,
    /// Set once an authenticated account claims the invitation
    pub user_id: Option<UserId>,
    /// Issue instant
    pub created_at: DateTime<Utc>,
}

/// Invitation store
pub struct InvitationStore {
    invitations: Arc<RwLock<HashMap<Uuid, TeacherInvitation>>>,
}

impl InvitationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            invitations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create an unlinked invitation for an email address
    pub fn invite(&self, email: &str, now: DateTime<Utc>) -> TeacherInvitation {
        let invitation = TeacherInvitation {
            id: Uuid::new_v4(),
            email: email.to_string(),
            user_id: None,
            created_at: now,
        };
        self.invitations
            .write()
            .insert(invitation.id, invitation.clone());
        invitation
    }

    /// Get invitation by ID
    pub fn get(&self, id: &Uuid) -> Option<TeacherInvitation> {
        self.invitations.read().get(id).cloned()
    }

    /// Claim the first unlinked invitation matching `email`
    /// case-insensitively. Returns the claimed record.
    fn claim(&self, email: &str, user_id: UserId) -> Option<TeacherInvitation> {
        let mut invitations = self.invitations.write();
        let invitation = invitations
            .values_mut()
            .find(|i| i.user_id.is_none() && i.email.eq_ignore_ascii_case(email))?;

        invitation.user_id = Some(user_id);
        Some(invitation.clone())
    }
}

impl Default for InvitationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Role assignment store, keyed on `(user, role)`.
pub struct RoleAssignmentStore {
    assignments: Arc<RwLock<HashSet<(UserId, Role)>>>,
}

impl RoleAssignmentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            assignments: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Grant a role. A set insert keyed on `(user, role)`: granting an
    /// already-held role is a no-op. Returns whether a row was added.
    pub fn grant(&self, user_id: UserId, role: Role) -> bool {
        self.assignments.write().insert((user_id, role))
    }

    /// Role check
    pub fn has_role(&self, user_id: &UserId, role: Role) -> bool {
        self.assignments.read().contains(&(*user_id, role))
    }

    /// Number of role rows held by one user
    pub fn count_for_user(&self, user_id: &UserId) -> usize {
        self.assignments
            .read()
            .iter()
            .filter(|(u, _)| u == user_id)
            .count()
    }
}

impl Default for RoleAssignmentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Teacher account linker
pub struct TeacherAccountLinker {
    invitations: Arc<InvitationStore>,
    roles: Arc<RoleAssignmentStore>,
}

impl TeacherAccountLinker {
    /// Create a linker over the given stores
    pub fn new(invitations: Arc<InvitationStore>, roles: Arc<RoleAssignmentStore>) -> Self {
        Self { invitations, roles }
    }

    /// Link the authenticated account to its pending teacher invitation,
    /// if one exists.
    ///
    /// Runs once per authenticated session; it must complete before the
    /// teacher role signal is reported resolved. No matching unlinked
    /// invitation is a normal no-op, not an error. Idempotent: a claimed
    /// invitation never matches again, and the role grant is a keyed
    /// upsert.
    pub fn try_link(&self, user_id: UserId, email: &str) -> bool {
        let Some(invitation) = self.invitations.claim(email, user_id) else {
            return false;
        };

        self.roles.grant(user_id, Role::Teacher);
        tracing::info!(
            user_id = %user_id,
            invitation_id = %invitation.id,
            "Linked teacher invitation to account"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linker() -> (Arc<InvitationStore>, Arc<RoleAssignmentStore>, TeacherAccountLinker) {
        let invitations = Arc::new(InvitationStore::new());
        let roles = Arc::new(RoleAssignmentStore::new());
        let linker = TeacherAccountLinker::new(invitations.clone(), roles.clone());
        (invitations, roles, linker)
    }

    #[test]
    fn test_link_is_case_insensitive_and_idempotent() {
        let (invitations, roles, linker) = linker();
        let invitation = invitations.invite("T@X.com", Utc::now());
        let user = Uuid::new_v4();

        assert!(linker.try_link(user, "t@x.com"));
        assert_eq!(invitations.get(&invitation.id).unwrap().user_id, Some(user));
        assert!(roles.has_role(&user, Role::Teacher));

        // Second invocation is a no-op with no duplicate role row.
        assert!(!linker.try_link(user, "t@x.com"));
        assert_eq!(roles.count_for_user(&user), 1);
    }

    #[test]
    fn test_no_matching_invitation_is_a_noop() {
        let (_invitations, roles, linker) = linker();
        let user = Uuid::new_v4();

        assert!(!linker.try_link(user, "nobody@example.com"));
        assert!(!roles.has_role(&user, Role::Teacher));
    }

    #[test]
    fn test_claimed_invitation_is_not_reclaimed() {
        let (invitations, roles, linker) = linker();
        invitations.invite("shared@school.edu", Utc::now());

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(linker.try_link(first, "SHARED@school.edu"));
        assert!(!linker.try_link(second, "shared@school.edu"));
        assert!(!roles.has_role(&second, Role::Teacher));
    }

    #[test]
    fn test_grant_is_keyed_upsert() {
        let roles = RoleAssignmentStore::new();
        let user = Uuid::new_v4();

        assert!(roles.grant(user, Role::Teacher));
        assert!(!roles.grant(user, Role::Teacher));
        assert!(roles.grant(user, Role::Admin));
        assert_eq!(roles.count_for_user(&user), 2);
    }
}
