use once_cell::sync::Lazy;
use tracing::error;

use super::password::{hash_password, verify_password};
use crate::model::{SUPERVISOR_ROLE, Supervisor};

struct SupervisorAccount {
    profile: Supervisor,
    password_hash: String,
}

/// (username, password, display name)
const SEED_ACCOUNTS: [(&str, &str, &str); 3] = [
    ("test1", "pass", "Test Admin 1"),
    ("test2", "pass2", "Test Admin 2"),
    ("test3", "pass3", "Test Admin 3"),
];

static ACCOUNTS: Lazy<Vec<SupervisorAccount>> = Lazy::new(|| {
    SEED_ACCOUNTS
        .iter()
        .filter_map(|(username, password, name)| match hash_password(password) {
            Ok(password_hash) => Some(SupervisorAccount {
                profile: Supervisor {
                    username: username.to_string(),
                    name: name.to_string(),
                    role: SUPERVISOR_ROLE.to_string(),
                },
                password_hash,
            }),
            Err(e) => {
                error!(username, error = %e, "failed to hash seed account password");
                None
            }
        })
        .collect()
});

// Verified against for unknown usernames so both failure paths cost the same.
static DECOY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("decoy").ok());

/// The supervisor profile for a matching username/password pair.
pub fn authenticate(username: &str, password: &str) -> Option<Supervisor> {
    match ACCOUNTS.iter().find(|a| a.profile.username == username) {
        Some(account) => verify_password(password, &account.password_hash)
            .ok()
            .map(|_| account.profile.clone()),
        None => {
            if let Some(decoy) = DECOY_HASH.as_deref() {
                let _ = verify_password(password, decoy);
            }
            None
        }
    }
}
