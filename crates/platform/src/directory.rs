//! Administrator directory: seeded accounts with Argon2id credentials.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use dashmap::DashMap;
use grievance_core::config::AdminSeed;
use grievance_core::types::Role;
use grievance_core::{GrievanceError, GrievanceResult};
use rand::rngs::OsRng;
use tracing::{info, warn};

/// An authenticated administrator. The role comes from the account record only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub username: String,
    pub role: Role,
}

struct StoredAccount {
    password_hash: String,
    role: Role,
}

pub struct AdminDirectory {
    accounts: DashMap<String, StoredAccount>,
}

impl Default for AdminDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminDirectory {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Build the directory from configured seeds, rejecting malformed hashes.
    pub fn from_seeds(seeds: &[AdminSeed]) -> GrievanceResult<Self> {
        let directory = Self::new();
        for seed in seeds {
            directory.add_account(&seed.username, &seed.password_hash, seed.role)?;
        }
        info!(accounts = directory.len(), "Admin directory loaded");
        Ok(directory)
    }

    pub fn add_account(&self, username: &str, password_hash: &str, role: Role) -> GrievanceResult<()> {
        if username.trim().is_empty() {
            return Err(GrievanceError::Config("admin username must not be empty".into()));
        }
        PasswordHash::new(password_hash).map_err(|e| {
            GrievanceError::Config(format!("invalid password hash for {username}: {e}"))
        })?;
        self.accounts.insert(
            username.to_string(),
            StoredAccount {
                password_hash: password_hash.to_string(),
                role,
            },
        );
        Ok(())
    }

    /// Check a username/password pair and return the account with its bound role.
    pub fn authenticate(&self, username: &str, password: &str) -> GrievanceResult<AdminAccount> {
        let stored = self
            .accounts
            .get(username)
            .map(|a| (a.password_hash.clone(), a.role));

        let Some((hash, role)) = stored else {
            // Burn a verification anyway so unknown usernames cost the same.
            if let Some(decoy) = self.accounts.iter().next().map(|a| a.password_hash.clone()) {
                let _ = verify_password(password, &decoy);
            }
            warn!("Login rejected");
            return Err(GrievanceError::AuthenticationFailed);
        };

        if verify_password(password, &hash) {
            Ok(AdminAccount {
                username: username.to_string(),
                role,
            })
        } else {
            warn!(username = %username, "Login rejected");
            Err(GrievanceError::AuthenticationFailed)
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Hash a password with Argon2id default parameters, producing a PHC string.
pub fn hash_password(password: &str) -> GrievanceResult<String> {
    hash_with(Argon2::default(), password)
}

/// Hash with explicit Argon2id cost parameters (memory KiB, iterations, lanes).
pub fn hash_password_with_params(
    password: &str,
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
) -> GrievanceResult<String> {
    let params = Params::new(m_cost, t_cost, p_cost, None)
        .map_err(|e| GrievanceError::Config(format!("invalid argon2 params: {e}")))?;
    hash_with(Argon2::new(Algorithm::Argon2id, Version::V0x13, params), password)
}

fn hash_with(argon2: Argon2<'_>, password: &str) -> GrievanceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GrievanceError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// Parameters are read back from the PHC string, so cheap test hashes verify cheaply.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
