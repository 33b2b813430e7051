//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! Identifiers are opaque strings rather than database row numbers, so records
//! can move between storage engines without rewriting references.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display`, `FromStr`, `AsRef<str>`, `From<String>` and `From<&str>`
///
/// Passing `generated` as the second argument also adds `generate()`, which
/// produces a random UUID v4 identifier.
///
/// # Example
///
/// ```rust
/// # use spice_store_core::define_id;
/// define_id!(CustomerId, generated);
/// define_id!(ExternalRef);
///
/// let customer_id = CustomerId::generate();
/// let external = ExternalRef::new("cs_test_123");
///
/// assert_eq!(external.as_str(), "cs_test_123");
/// assert_eq!(customer_id.as_str().len(), 36);
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = external;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::convert::Infallible;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
    ($name:ident, generated) => {
        $crate::define_id!($name);

        impl $name {
            /// Generate a new random identifier (UUID v4).
            #[must_use]
            pub fn generate() -> Self {
                Self($crate::__uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

// Locally generated entity IDs
define_id!(ProductId, generated);
define_id!(OrderId, generated);
define_id!(TransactionId, generated);

// Checkout session token issued by the payment processor
define_id!(SessionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = SessionId::new("cs_test_abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cs_test_abc\"");

        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display_and_from_str() {
        let id: ProductId = "p1".parse().unwrap();
        assert_eq!(id.to_string(), "p1");
        assert_eq!(String::from(id), "p1");
    }
}
