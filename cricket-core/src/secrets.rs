//! Secret resolution (§4.8). The secret store itself is an external
//! collaborator — out of scope, named by interface only — so this module
//! defines the trait the rest of the system depends on plus the literal/
//! prefix dispatch rule that decides whether a value needs resolving at all.

use crate::error::CoreError;

pub const SECRET_REFERENCE_PREFIX: &str = "projects/";

/// Opaque access to a secret-management backend. Implementations live
/// outside this crate; this crate only needs the contract.
pub trait SecretStore {
    fn access(&self, reference: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// A [`SecretStore`] that treats every reference as already-resolved. Used
/// in local development and tests, where secrets arrive as plain env values.
pub struct LiteralSecretStore;

impl SecretStore for LiteralSecretStore {
    fn access(&self, reference: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(reference.to_string())
    }
}

/// Resolves a configured value: a reference beginning with
/// [`SECRET_REFERENCE_PREFIX`] is resolved through `store`; anything else is
/// used literally.
pub fn resolve_secret(value_or_reference: &str, store: &dyn SecretStore) -> Result<String, CoreError> {
    if let Some(_reference) = value_or_reference.strip_prefix(SECRET_REFERENCE_PREFIX) {
        store
            .access(value_or_reference)
            .map_err(|source| CoreError::SecretResolution {
                reference: value_or_reference.to_string(),
                source,
            })
    } else {
        Ok(value_or_reference.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_values_pass_through_unresolved() {
        let store = LiteralSecretStore;
        assert_eq!(resolve_secret("dev-api-key", &store).unwrap(), "dev-api-key");
    }

    #[test]
    fn prefixed_values_go_through_the_store() {
        let store = LiteralSecretStore;
        let resolved = resolve_secret("projects/my-proj/secrets/api-key/versions/latest", &store).unwrap();
        assert_eq!(resolved, "projects/my-proj/secrets/api-key/versions/latest");
    }
}
