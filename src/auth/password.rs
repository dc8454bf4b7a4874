//! bcrypt hashing, kept off the async worker threads

use crate::error::Result;

pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("hunter2", 4).await.unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).await.unwrap());
        assert!(!verify_password("hunter3", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_against_garbage_hash_fails() {
        assert!(verify_password("hunter2", "not-a-bcrypt-hash").await.is_err());
    }
}
