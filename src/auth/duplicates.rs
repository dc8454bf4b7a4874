//! Early rejection of signups that collide with existing accounts

use std::fmt;

use super::SignupCandidate;
use crate::error::Result;
use crate::store::CredentialStore;

/// Which identity attribute collided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Username,
    Email,
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateField::Username => write!(f, "username"),
            DuplicateField::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateCheck {
    Clear,
    Conflict(DuplicateField),
}

/// Look for an existing user with the candidate's username or email.
///
/// Advisory only: two concurrent signups can both pass. The store's unique
/// constraints reject the loser at insert time with the same conflict error.
pub async fn check_no_duplicate(
    store: &dyn CredentialStore,
    candidate: &SignupCandidate,
) -> Result<DuplicateCheck> {
    let existing = store
        .find_user_by_username_or_email(&candidate.username, &candidate.email)
        .await?;

    Ok(match existing {
        None => DuplicateCheck::Clear,
        Some(user) if user.username == candidate.username => {
            DuplicateCheck::Conflict(DuplicateField::Username)
        }
        Some(_) => DuplicateCheck::Conflict(DuplicateField::Email),
    })
}
