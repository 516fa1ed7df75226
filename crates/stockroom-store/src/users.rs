//! Account storage and password verification.
//!
//! Accounts are kept as a JSON array in `usuarios.json`. Passwords are
//! stored as bcrypt hashes. Files written by the earlier plaintext
//! variant still load: a stored value that is not a bcrypt hash is
//! compared as plaintext, and callers upgrade it to a hash after a
//! successful login.
//!
//! Hashing and verification are CPU-bound. They are free functions so
//! the web layer can run them on the blocking pool without holding the
//! store lock.

use std::path::{Path, PathBuf};

use stockroom_types::{Role, User};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::persist::{read_json_or_default, write_json_atomic};

/// Outcome of checking a password against a stored account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Wrong password.
    Rejected,
    /// Correct password, stored as a bcrypt hash.
    Accepted,
    /// Correct password, stored as legacy plaintext; rehash it.
    AcceptedLegacy,
}

impl Verification {
    /// Whether the password was correct.
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedLegacy)
    }
}

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, StoreError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Check `password` against the stored credential of `user`.
pub fn verify_password(user: &User, password: &str) -> Result<Verification, StoreError> {
    if is_bcrypt_hash(&user.password_hash) {
        let ok = bcrypt::verify(password, &user.password_hash)?;
        return Ok(if ok {
            Verification::Accepted
        } else {
            Verification::Rejected
        });
    }

    if user.password_hash == password {
        Ok(Verification::AcceptedLegacy)
    } else {
        Ok(Verification::Rejected)
    }
}

fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && ["$2a$", "$2b$", "$2x$", "$2y$"].iter().any(|p| value.starts_with(p))
}

/// File-backed account list.
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: Vec<User>,
}

impl UserStore {
    /// Load accounts from `path`. A missing file yields no accounts.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let users: Vec<User> = read_json_or_default(&path)?;
        let legacy = users
            .iter()
            .filter(|u| !is_bcrypt_hash(&u.password_hash))
            .count();
        if legacy > 0 {
            warn!(
                path = %path.display(),
                legacy,
                "accounts with plaintext passwords found; they are rehashed on next login"
            );
        }
        info!(path = %path.display(), users = users.len(), "accounts loaded");
        Ok(Self { path, users })
    }

    /// The account file this store writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All accounts, in creation order.
    pub fn list(&self) -> &[User] {
        &self.users
    }

    /// Whether no account exists.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Look up an account.
    pub fn find(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Add an account whose password has already been hashed.
    pub fn insert(&mut self, user: User) -> Result<(), StoreError> {
        if user.username.trim().is_empty() {
            return Err(StoreError::Invalid("username must not be blank".to_owned()));
        }
        if self.find(&user.username).is_some() {
            return Err(StoreError::DuplicateUser(user.username));
        }
        let username = user.username.clone();
        let role = user.role;
        self.users.push(user);
        if let Err(e) = self.save() {
            self.users.pop();
            return Err(e);
        }
        info!(username = %username, %role, "account created");
        Ok(())
    }

    /// Replace the stored credential of an account.
    pub fn set_password_hash(&mut self, username: &str, hash: String) -> Result<(), StoreError> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| StoreError::UserNotFound(username.to_owned()))?;
        let previous = std::mem::replace(&mut user.password_hash, hash);

        if let Err(e) = self.save() {
            if let Some(user) = self.users.iter_mut().find(|u| u.username == username) {
                user.password_hash = previous;
            }
            return Err(e);
        }
        info!(username, "password hash updated");
        Ok(())
    }

    /// Remove an account, refusing to remove the last admin.
    ///
    /// Returns the removed account so the caller can clean up its photo.
    pub fn delete(&mut self, username: &str) -> Result<User, StoreError> {
        let index = self
            .users
            .iter()
            .position(|u| u.username == username)
            .ok_or_else(|| StoreError::UserNotFound(username.to_owned()))?;

        let admins = self.users.iter().filter(|u| u.role == Role::Admin).count();
        let is_admin = self.users.get(index).is_some_and(|u| u.role == Role::Admin);
        if is_admin && admins <= 1 {
            return Err(StoreError::LastAdmin);
        }

        let removed = self.users.remove(index);
        if let Err(e) = self.save() {
            self.users.insert(index, removed);
            return Err(e);
        }
        info!(username, "account deleted");
        Ok(removed)
    }

    /// Seed an admin account when the store holds no accounts.
    ///
    /// Returns `true` if an account was created.
    pub fn ensure_admin(
        &mut self,
        username: &str,
        password: &str,
        cost: u32,
    ) -> Result<bool, StoreError> {
        if !self.users.is_empty() {
            return Ok(false);
        }
        let user = User {
            username: username.to_owned(),
            password_hash: hash_password(password, cost)?,
            role: Role::Admin,
            photo: None,
        };
        self.insert(user)?;
        warn!(username, "no accounts found; created bootstrap admin, change its password");
        Ok(true)
    }

    fn save(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &self.users)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    fn account(username: &str, role: Role) -> User {
        User {
            username: username.to_owned(),
            password_hash: hash_password("secret", COST).unwrap(),
            role,
            photo: None,
        }
    }

    #[test]
    fn hashed_password_verifies() {
        let user = account("ana", Role::Admin);
        assert_eq!(verify_password(&user, "secret").unwrap(), Verification::Accepted);
        assert_eq!(verify_password(&user, "wrong").unwrap(), Verification::Rejected);
    }

    #[test]
    fn plaintext_password_is_legacy() {
        let user = User {
            username: "old".to_owned(),
            password_hash: "letmein".to_owned(),
            role: Role::Viewer,
            photo: None,
        };
        assert_eq!(
            verify_password(&user, "letmein").unwrap(),
            Verification::AcceptedLegacy
        );
        assert_eq!(verify_password(&user, "nope").unwrap(), Verification::Rejected);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = UserStore::open(dir.path().join("users.json")).unwrap();
        store.insert(account("ana", Role::Admin)).unwrap();
        assert!(matches!(
            store.insert(account("ana", Role::Viewer)),
            Err(StoreError::DuplicateUser(_))
        ));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn last_admin_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = UserStore::open(dir.path().join("users.json")).unwrap();
        store.insert(account("ana", Role::Admin)).unwrap();
        store.insert(account("bob", Role::Viewer)).unwrap();

        assert!(matches!(store.delete("ana"), Err(StoreError::LastAdmin)));
        assert_eq!(store.delete("bob").unwrap().username, "bob");
        assert!(matches!(store.delete("bob"), Err(StoreError::UserNotFound(_))));
    }

    #[test]
    fn accounts_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        {
            let mut store = UserStore::open(&path).unwrap();
            store.insert(account("ana", Role::Admin)).unwrap();
        }
        let reopened = UserStore::open(&path).unwrap();
        assert_eq!(reopened.find("ana").map(|u| u.role), Some(Role::Admin));
    }

    #[test]
    fn ensure_admin_only_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = UserStore::open(dir.path().join("users.json")).unwrap();
        assert!(store.ensure_admin("admin", "admin", COST).unwrap());
        assert!(!store.ensure_admin("other", "x", COST).unwrap());
        let admin = store.find("admin").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(verify_password(admin, "admin").unwrap().is_accepted());
    }

    #[test]
    fn set_password_hash_upgrades_legacy_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"[{"username": "old", "password": "letmein", "role": "admin"}]"#)
            .unwrap();

        let mut store = UserStore::open(&path).unwrap();
        let hash = hash_password("letmein", COST).unwrap();
        store.set_password_hash("old", hash).unwrap();

        let reopened = UserStore::open(&path).unwrap();
        let user = reopened.find("old").unwrap();
        assert_eq!(verify_password(user, "letmein").unwrap(), Verification::Accepted);
    }
}
