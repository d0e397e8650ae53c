//! Typed identifier newtypes.
//!
//! Outputs are addressed two ways: by their catalogue identity
//! ([`OutputId`]) and by the hardware pin they drive ([`PhysicalLine`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident($inner:ty)) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw value.
            #[must_use]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Access the raw value.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Catalogue identity of an [`Output`](crate::output::Output).
    OutputId(u32)
);

define_id!(
    /// Hardware-level address (pin number) of one controllable output.
    PhysicalLine(u16)
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let id = OutputId::new(12);
        let parsed: OutputId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_serialize_as_bare_number() {
        let json = serde_json::to_string(&PhysicalLine::new(13)).unwrap();
        assert_eq!(json, "13");
    }

    #[test]
    fn should_return_error_when_parsing_non_numeric_id() {
        assert!(OutputId::from_str("led-1").is_err());
    }

    #[test]
    fn should_order_lines_numerically() {
        assert!(PhysicalLine::new(2) < PhysicalLine::new(10));
    }
}
