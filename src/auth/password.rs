use anyhow::Context;
use lazy_static::lazy_static;
use tracing::{debug, warn};

/// bcrypt work factor; matches the hashes already stored in `user.password`.
pub const HASH_COST: u32 = 10;

pub async fn hash_password(plain: &str) -> anyhow::Result<String> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || {
        debug!("hashing password");
        bcrypt::hash(plain, HASH_COST)
    })
    .await
    .context("hash task panicked")?
    .context("bcrypt hash")
}

/// `Ok(false)` on mismatch, including a stored hash that is not valid bcrypt.
pub async fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .context("verify task panicked")?;
    match outcome {
        Ok(ok) => Ok(ok),
        Err(e) => {
            warn!(error = %e, "stored password hash is unreadable");
            Ok(false)
        }
    }
}

lazy_static! {
    /// Stand-in hash so a login for an unknown email costs one bcrypt verify too.
    static ref PLACEHOLDER_HASH: Option<String> =
        bcrypt::hash("placeholder-credential", HASH_COST).ok();
}

/// Burns one verify at `HASH_COST` and always reports a mismatch.
pub async fn verify_against_placeholder(plain: &str) -> anyhow::Result<bool> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || {
        if let Some(hash) = PLACEHOLDER_HASH.as_deref() {
            let _ = bcrypt::verify(plain, hash);
        }
    })
    .await
    .context("verify task panicked")?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).await.expect("hashing should succeed");
        assert!(verify_password(password, &hash).await.expect("verify should succeed"));
    }

    #[tokio::test]
    async fn hash_uses_cost_ten_and_never_contains_plaintext() {
        // punctuation never appears in bcrypt's base64 alphabet
        let hash = hash_password("p1!#").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$10$"));
        assert!(!hash.contains("p1!#"));
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash_password("same").await.unwrap();
        let b = hash_password("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple").await.unwrap();
        assert!(!verify_password("wrong-password", &hash).await.expect("verify should not error"));
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-valid-hash").await.unwrap());
    }

    #[tokio::test]
    async fn placeholder_is_real_bcrypt_and_never_matches() {
        let hash = PLACEHOLDER_HASH.as_deref().expect("placeholder hash");
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$10$"));
        assert!(!verify_against_placeholder("placeholder").await.unwrap());
        assert!(!verify_against_placeholder("").await.unwrap());
    }
}
