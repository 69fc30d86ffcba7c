use facet::Facet;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Error returned when an id cannot be parsed from its string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    field: &'static str,
    input: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.field, self.input)
    }
}

impl Error for ParseIdError {}

macro_rules! define_u64_id {
    (
        $(#[$meta:meta])*
        $name:ident,
        field = $field:literal
    ) => {
        #[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[facet(transparent)]
        $(#[$meta])*
        pub struct $name(u64);

        impl $name {
            pub const fn from_raw(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let parsed = match trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => trimmed.parse::<u64>(),
                };
                parsed.map(Self).map_err(|_| ParseIdError {
                    field: $field,
                    input: s.to_string(),
                })
            }
        }
    };
}

define_u64_id!(
    /// Identity of a live object in the host's reference graph.
    ///
    /// Identity is by address (or an equivalent host-assigned key), never by
    /// value equality: two equal values at different addresses are different
    /// objects.
    ObjectId,
    field = "object_id"
);

define_u64_id!(
    /// Identity of one registration in a tracking registry.
    ///
    /// Ids are handed out per registration, so registering the same object
    /// twice yields two distinct handles.
    HandleId,
    field = "handle_id"
);

impl ObjectId {
    pub fn from_address(address: usize) -> Self {
        Self(address as u64)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
