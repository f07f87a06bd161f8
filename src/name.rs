//! Validated, non-empty names for users, books, categories and payment modes.

/// Define a newtype around a `String` that is never empty or only whitespace.
///
/// `$error` is the [crate::Error] returned when validation fails.
macro_rules! non_empty_name {
    ($(#[$meta:meta])* $name:ident, $error:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, Hash)]
        pub struct $name(String);

        impl $name {
            /// Create a name with surrounding whitespace removed.
            ///
            /// # Errors
            ///
            /// This function will return an error if `name` is empty or only whitespace.
            pub fn new(name: &str) -> Result<Self, crate::Error> {
                let name = name.trim();

                if name.is_empty() {
                    Err($error)
                } else {
                    Ok(Self(name.to_owned()))
                }
            }

            /// Create a name without validation.
            ///
            /// The caller should ensure that the string is not empty.
            ///
            /// This function has `_unchecked` in the name but is not `unsafe`, because if the
            /// non-empty invariant is violated it will cause incorrect behaviour but not affect
            /// memory safety.
            pub fn new_unchecked(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use non_empty_name;
