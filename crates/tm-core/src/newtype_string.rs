//! Macro for defining strongly-typed SQL identifier newtypes.
//!
//! All identifier newtypes share the same invariant (non-empty, no NUL byte,
//! not in SQLite's reserved `sqlite_` namespace) and the same set of trait
//! impls. SQLite compares identifiers case-insensitively, so
//! [`matches`](TableName::matches) is the comparison to use against names
//! read back from the live store.

/// Check an identifier against the shared rules, returning the reason it
/// is rejected.
pub(crate) fn identifier_problem(s: &str) -> Option<&'static str> {
    if s.is_empty() {
        Some("must not be empty")
    } else if s.contains('\0') {
        Some("must not contain NUL")
    } else if s.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("sqlite_")) {
        Some("the sqlite_ prefix is reserved by the store")
    } else {
        None
    }
}

/// Define a strongly-typed SQL identifier newtype.
///
/// Generates:
/// - The struct with `Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize`
/// - Custom `Deserialize` (rejects invalid identifiers)
/// - `new()` (panics on invalid), `try_new()`, `as_str()`, `into_inner()`, `matches()`
/// - `Display`, `AsRef<str>`, `Deref<Target=str>`, `Borrow<str>`
/// - `TryFrom<String>`, `TryFrom<&str>`
/// - `PartialEq<str>`, `PartialEq<&str>`, `PartialEq<String>`
macro_rules! define_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                match $crate::newtype_string::identifier_problem(&s) {
                    None => Ok(Self(s)),
                    Some(reason) => Err(serde::de::Error::custom(format!(
                        concat!(stringify!($Name), " '{}' {}"),
                        s, reason
                    ))),
                }
            }
        }

        impl $Name {
            /// Create a new instance, panicking if the identifier is invalid.
            ///
            /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
            pub fn new(name: impl Into<String>) -> Self {
                let s = name.into();
                if let Some(reason) = $crate::newtype_string::identifier_problem(&s) {
                    panic!(concat!(stringify!($Name), " '{}' {}"), s, reason);
                }
                Self(s)
            }

            /// Try to create a new instance, returning `None` if the identifier is invalid.
            pub fn try_new(name: impl Into<String>) -> Option<Self> {
                let s = name.into();
                match $crate::newtype_string::identifier_problem(&s) {
                    None => Some(Self(s)),
                    Some(_) => None,
                }
            }

            /// Return the underlying name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Compare against a name the way the store does (ASCII case-insensitive).
            pub fn matches(&self, other: &str) -> bool {
                self.0.eq_ignore_ascii_case(other)
            }

            /// The identifier quoted for use in SQL text.
            pub fn quoted(&self) -> String {
                $crate::sql_utils::quote_ident(&self.0)
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str { &self.0 }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str { &self.0 }
        }

        impl TryFrom<String> for $Name {
            type Error = $crate::error::CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                match $crate::newtype_string::identifier_problem(&s) {
                    None => Ok(Self(s)),
                    Some(reason) => Err($crate::error::CoreError::InvalidIdentifier {
                        name: s,
                        reason: reason.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<&str> for $Name {
            type Error = $crate::error::CoreError;
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::try_from(s.to_string())
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool { self.0 == other }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool { self.0 == *other }
        }

        impl PartialEq<String> for $Name {
            fn eq(&self, other: &String) -> bool { self.0 == *other }
        }
    };
}

pub(crate) use define_identifier;
