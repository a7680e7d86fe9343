use std::fmt;

use crate::database::{Role, User};
use crate::error::RpcError;

/// Access requirement attached to every procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTier {
    Public,
    Authenticated,
    TeacherOrAdmin,
    AdminOnly,
}

impl AccessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Public => "public",
            AccessTier::Authenticated => "authenticated",
            AccessTier::TeacherOrAdmin => "teacher-or-admin",
            AccessTier::AdminOnly => "admin-only",
        }
    }

    fn admits(&self, role: Role) -> bool {
        match self {
            AccessTier::Public | AccessTier::Authenticated => true,
            AccessTier::TeacherOrAdmin => matches!(role, Role::Teacher | Role::Admin),
            AccessTier::AdminOnly => role == Role::Admin,
        }
    }

    /// Pure decision over the caller's identity; no side effects, no I/O
    pub fn check(&self, user: Option<&User>) -> Result<(), RpcError> {
        if *self == AccessTier::Public {
            return Ok(());
        }

        let Some(user) = user else {
            return Err(RpcError::unauthorized("Please login"));
        };

        if self.admits(user.role) {
            Ok(())
        } else {
            Err(RpcError::forbidden(match self {
                AccessTier::AdminOnly => "Admin role required",
                _ => "Teacher or admin role required",
            }))
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
