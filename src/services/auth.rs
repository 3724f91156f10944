//! Contraseñas: hash bcrypt, verificación y generación aleatoria

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;

use crate::utils::errors::AppError;
use crate::utils::translations::Localized;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const GENERATED_PASSWORD_LENGTH: usize = 16;

/// Hash bcrypt de una contraseña
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::Hash(e.to_string()))
}

/// Un hash corrupto cuenta como contraseña incorrecta
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match verify(password, password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("⚠️ Hash de contraseña inválido: {}", e);
            false
        }
    }
}

/// Contraseña alfanumérica aleatoria
pub fn generate_password(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Longitud mínima y no exclusivamente numérica
pub fn check_password_strength(password: &str) -> Result<(), Localized> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Localized::new(
            format!("This password is too short. It must contain at least {} characters.", MIN_PASSWORD_LENGTH),
            format!("كلمة المرور قصيرة جداً. يجب أن تحتوي على {} أحرف على الأقل.", MIN_PASSWORD_LENGTH),
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(Localized::new(
            "This password is entirely numeric.",
            "كلمة المرور تتكون من أرقام فقط.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        // coste mínimo para que el test sea rápido
        let hashed = bcrypt::hash("s3cret-pass", 4).unwrap();
        assert!(verify_password("s3cret-pass", &hashed));
        assert!(!verify_password("wrong", &hashed));
        assert!(!verify_password("s3cret-pass", "not-a-hash"));
    }

    #[test]
    fn test_generated_password() {
        let password = generate_password(GENERATED_PASSWORD_LENGTH);
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password(GENERATED_PASSWORD_LENGTH));
    }

    #[test]
    fn test_password_strength() {
        assert!(check_password_strength("short").is_err());
        assert!(check_password_strength("1234567890").is_err());
        assert!(check_password_strength("fleet-admin-2024").is_ok());
    }
}
