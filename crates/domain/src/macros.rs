//! Macro for implementing Display and FromStr for domain enums
//!
//! Slot kinds and mutation phases travel as lowercase strings (wire bodies,
//! log fields). This macro provides both conversions from one mapping.
//!
//! # Example
//!
//! ```rust
//! use planora_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Visibility {
//!     Private,
//!     Shared,
//! }
//!
//! impl_domain_status_conversions!(Visibility {
//!     Private => "private",
//!     Shared => "shared",
//! });
//!
//! assert_eq!(Visibility::Shared.to_string(), "shared");
//! assert_eq!("PRIVATE".parse::<Visibility>().unwrap(), Visibility::Private);
//! ```

/// Implements Display and FromStr traits for domain enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and names the enum on failure
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
