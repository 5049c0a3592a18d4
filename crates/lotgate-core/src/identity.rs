//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers that flow through Lotgate.
//! Each identifier is a distinct type, so you cannot pass a [`VesselId`]
//! where a [`BatchId`] is expected.
//!
//! ## Validation
//!
//! All three identifiers are caller-supplied strings (lot numbers printed on
//! travellers, equipment tags, identity-layer subjects). They are validated
//! at construction and on deserialization:
//!
//! - non-empty after trimming, no surrounding whitespace
//! - at most [`MAX_IDENTIFIER_LEN`] bytes
//! - ASCII alphanumerics plus `-`, `_`, `.`, `:`, `@`

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of any identifier, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 128;

fn validate_identifier(kind: &'static str, value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &'static str| ValidationError::InvalidIdentifier {
        kind,
        value: value.to_string(),
        reason,
    };

    if value.trim().is_empty() {
        return Err(invalid("must be non-empty"));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid("exceeds 128 bytes"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@'))
    {
        return Err(invalid("allowed characters are [A-Za-z0-9-_.:@]"));
    }
    Ok(())
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create the identifier from a string, validating its format.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                validate_identifier($kind, &value)?;
                Ok(Self(value))
            }

            /// Access the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Identifier of a production lot. Immutable once the batch is scheduled.
    BatchId,
    "batch"
);

string_identifier!(
    /// An authenticated actor (operator, manager, QC technician, supervisor).
    ///
    /// Authentication happens upstream; by the time a `PrincipalId` reaches
    /// this crate it is trusted to name the caller.
    PrincipalId,
    "principal"
);

string_identifier!(
    /// A piece of production equipment with a minimum competency requirement.
    VesselId,
    "vessel"
);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_typical_identifiers() {
        assert!(BatchId::new("B-2026-0001").is_ok());
        assert!(PrincipalId::new("op.alice@plant-7").is_ok());
        assert!(VesselId::new("reactor:R3").is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(BatchId::new("").is_err());
        assert!(BatchId::new("   ").is_err());
        assert!(PrincipalId::new(" op-1").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let long = "x".repeat(MAX_IDENTIFIER_LEN + 1);
        let err = VesselId::new(long).unwrap_err();
        assert!(err.to_string().contains("128"));
    }

    #[test]
    fn rejects_forbidden_characters() {
        let err = BatchId::new("B1/../etc").unwrap_err();
        match err {
            ValidationError::InvalidIdentifier { kind, .. } => assert_eq!(kind, "batch"),
            other => panic!("expected InvalidIdentifier, got {other:?}"),
        }
    }

    #[test]
    fn display_is_raw_value() {
        let id = PrincipalId::new("sup-1").unwrap();
        assert_eq!(id.to_string(), "sup-1");
        assert_eq!(id.as_str(), "sup-1");
    }

    #[test]
    fn serde_is_transparent_string() {
        let id = BatchId::new("B1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"B1\"");
        let back: BatchId = serde_json::from_str("\"B1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialization_validates() {
        let result: Result<VesselId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn from_str_parses() {
        let id: VesselId = "V1".parse().unwrap();
        assert_eq!(id.as_str(), "V1");
    }

    proptest! {
        #[test]
        fn allowed_alphabet_round_trips(value in "[A-Za-z0-9_.:@-]{1,128}") {
            let id = BatchId::new(value.clone()).unwrap();
            prop_assert_eq!(id.as_str(), value.as_str());
            let json = serde_json::to_string(&id).unwrap();
            let back: BatchId = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, id);
        }

        #[test]
        fn any_foreign_character_is_rejected(
            prefix in "[A-Za-z0-9]{0,20}",
            bad in any::<char>().prop_filter("outside the identifier alphabet", |c| {
                !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.' | ':' | '@')
            }),
            suffix in "[A-Za-z0-9]{0,20}",
        ) {
            let value = format!("{prefix}{bad}{suffix}");
            prop_assert!(PrincipalId::new(value).is_err());
        }
    }
}
