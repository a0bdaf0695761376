use uuid::Uuid;

use crate::constants::RECOVERY_CODE_LEN;
use crate::error::IdentityError;

/// Parse the deployment namespace used to derive client ids.
pub fn parse_namespace(s: &str) -> Result<Uuid, IdentityError> {
    Ok(Uuid::parse_str(s.trim())?)
}

/// Derive the stable client id for a recovery code.
///
/// Name-based (v5, SHA-1) so the same code always maps back to the same
/// client within one namespace.
pub fn derive_client_id(namespace: &Uuid, recovery_code: &str) -> Result<String, IdentityError> {
    if recovery_code.is_empty() {
        return Err(IdentityError::EmptyRecoveryCode);
    }
    Ok(Uuid::new_v5(namespace, recovery_code.as_bytes()).to_string())
}

/// Generate a short, upper-case recovery code.
pub fn generate_recovery_code() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..RECOVERY_CODE_LEN].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

    #[test]
    fn test_derivation_deterministic() {
        let ns = parse_namespace(NS).unwrap();
        let a = derive_client_id(&ns, "ABC123").unwrap();
        let b = derive_client_id(&ns, "ABC123").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, derive_client_id(&ns, "ABC124").unwrap());
    }

    #[test]
    fn test_derivation_depends_on_namespace() {
        let ns1 = parse_namespace(NS).unwrap();
        let ns2 = Uuid::new_v4();
        assert_ne!(
            derive_client_id(&ns1, "ABC123").unwrap(),
            derive_client_id(&ns2, "ABC123").unwrap()
        );
    }

    #[test]
    fn test_empty_code_rejected() {
        let ns = parse_namespace(NS).unwrap();
        assert!(derive_client_id(&ns, "").is_err());
    }

    #[test]
    fn test_bad_namespace() {
        assert!(parse_namespace("not-a-uuid").is_err());
    }

    #[test]
    fn test_recovery_code_shape() {
        let code = generate_recovery_code();
        assert_eq!(code.len(), RECOVERY_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
