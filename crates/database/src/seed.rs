//! Development users for local setups.

use crate::entities::{NewUser, User};
use crate::repos::UserRepository;
use crate::types::StoreResult;

pub const DEFAULT_USERS: &[(&str, &str)] = &[
    ("user_1", "You (Simon)"),
    ("user_2", "John Doe"),
    ("user_3", "Jane Smith"),
    ("user_4", "Alex Johnson"),
    ("user_5", "Diana Prince"),
];

/// Upsert [`DEFAULT_USERS`]; safe to run repeatedly.
pub async fn seed_default_users(users: &UserRepository) -> StoreResult<Vec<User>> {
    let mut seeded = Vec::with_capacity(DEFAULT_USERS.len());
    for (id, name) in DEFAULT_USERS {
        seeded.push(users.upsert(&NewUser::new(*id, *name)).await?);
    }
    Ok(seeded)
}
