// FILE: crates/cli/src/auth.rs

use anyhow::{bail, Result};

/// Decides whether a caller may run administrative commands
pub trait Authorizer {
    fn authorize(&self, supplied: Option<&str>) -> Result<()>;
}

/// Single shared admin password taken from `app.admin_password`
#[derive(Debug, Clone)]
pub struct SharedSecret {
    secret: Option<String>,
}

impl SharedSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }
}

impl Authorizer for SharedSecret {
    fn authorize(&self, supplied: Option<&str>) -> Result<()> {
        let Some(secret) = &self.secret else {
            bail!("Admin commands are disabled: set app.admin_password or PERPUS_APP_ADMIN_PASSWORD");
        };

        match supplied {
            None => bail!("This command requires --password or PERPUS_ADMIN_PASSWORD"),
            Some(attempt) if constant_time_eq(secret.as_bytes(), attempt.as_bytes()) => {
                log::debug!("Admin access granted");
                Ok(())
            }
            Some(_) => {
                log::warn!("Rejected admin password");
                bail!("Incorrect admin password")
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_password() {
        let auth = SharedSecret::new(Some("rahasia".to_string()));
        assert!(auth.authorize(Some("rahasia")).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_password() {
        let auth = SharedSecret::new(Some("rahasia".to_string()));
        assert!(auth.authorize(Some("Rahasia")).is_err());
        assert!(auth.authorize(Some("rahasia ")).is_err());
        assert!(auth.authorize(None).is_err());
    }

    #[test]
    fn test_unset_secret_refuses_everyone() {
        let auth = SharedSecret::new(None);
        assert!(auth.authorize(Some("")).is_err());

        let empty = SharedSecret::new(Some(String::new()));
        assert!(empty.authorize(Some("")).is_err());
    }
}
