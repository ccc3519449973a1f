//! Newtype IDs for type-safe row references.
//!
//! Both users and snippets are keyed by `SERIAL` columns, so every ID wraps a
//! positive `i32`. Parsing from text (path segments, CLI arguments) rejects
//! anything that is not a strictly positive decimal integer.

/// Error returned when a string is not a valid row ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// The input is not a base-10 integer that fits in an `i32`.
    #[error("id must be a decimal integer")]
    NotAnInteger,
    /// The input is zero or negative.
    #[error("id must be positive")]
    NotPositive,
}

/// Parse a strictly positive `i32` from text.
///
/// Used by the generated `FromStr` impls; exposed so callers can share the
/// exact rule.
///
/// # Errors
///
/// Returns [`ParseIdError`] for non-integers (`"1.58"`, `"abc"`, `""`) and
/// for values below one.
pub fn parse_positive(s: &str) -> Result<i32, ParseIdError> {
    let value: i32 = s.parse().map_err(|_| ParseIdError::NotAnInteger)?;
    if value < 1 {
        return Err(ParseIdError::NotPositive);
    }
    Ok(value)
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `Display` and a `FromStr` that only accepts positive integers
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use snippetbox_core::define_id;
/// define_id!(CommentId);
///
/// let id: CommentId = "42".parse().unwrap();
/// assert_eq!(id.as_i32(), 42);
/// assert!("-1".parse::<CommentId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::ParseIdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                $crate::types::id::parse_positive(s).map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(SnippetId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_ids() {
        assert_eq!("1".parse::<SnippetId>().unwrap(), SnippetId::new(1));
        assert_eq!("2147483647".parse::<UserId>().unwrap().as_i32(), i32::MAX);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!("0".parse::<SnippetId>(), Err(ParseIdError::NotPositive));
        assert_eq!("-1".parse::<SnippetId>(), Err(ParseIdError::NotPositive));
    }

    #[test]
    fn test_rejects_non_integers() {
        for input in ["", "1.58", "something", " 1", "2147483648"] {
            assert_eq!(
                input.parse::<SnippetId>(),
                Err(ParseIdError::NotAnInteger),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId::new(7));
    }
}
