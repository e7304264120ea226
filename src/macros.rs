/// Generates the label plumbing for a fieldless enum whose variants are shown to
/// users (and persisted) as fixed strings.
///
/// Each variant maps to one canonical label and any number of accepted aliases.
/// The macro implements:
/// - `ALL`, every variant in declaration order
/// - `as_str()`, the canonical label
/// - `Display`, writing the canonical label
/// - `FromStr`, matching the label or an alias, ignoring ASCII case and surrounding whitespace
/// - `Serialize` / `Deserialize` through the canonical label
///
/// # Example
/// ```rust,ignore
/// labeled_enum!(Difficulty, "difficulty", {
///     Easy => "Easy",
///     Medium => "Medium",
///     Hard => "Hard",
/// });
/// ```
/// Parsing `" easy "` yields `Difficulty::Easy`, and serializing it writes `"Easy"`.
///
/// # Notes
/// - The enum itself must be declared separately; the macro only adds impls.
/// - Facet matching compares against `as_str()` exactly, so aliases only help parsing.
#[macro_export]
macro_rules! labeled_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $(
                    if wanted.eq_ignore_ascii_case($label)
                        $(|| wanted.eq_ignore_ascii_case($alias))*
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("Unknown {}: {s}", $kind))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}
