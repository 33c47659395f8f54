/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST field operators.
//!
//! An operator decides where a field's value comes from: the stream, the
//! template's initial value, or the field's dictionary entry.

use ironfast_core::value::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator bound to a field instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Operator {
    /// The value is always on the wire; nullable when optional.
    #[default]
    None,
    /// The value is the initial value; optional fields spend one bit on presence.
    Constant,
    /// A clear bit selects the initial value.
    Default,
    /// A clear bit repeats the dictionary value.
    Copy,
    /// A clear bit takes the dictionary value plus one.
    Increment,
    /// The wire carries the difference to the dictionary value.
    Delta,
    /// The wire carries the trailing part that differs from the dictionary value.
    Tail,
}

impl Operator {
    /// Returns the operator's template name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Constant => "constant",
            Self::Default => "default",
            Self::Copy => "copy",
            Self::Increment => "increment",
            Self::Delta => "delta",
            Self::Tail => "tail",
        }
    }

    /// Returns true if a field with this operator consumes a presence map bit.
    #[must_use]
    pub const fn uses_presence_bit(&self, mandatory: bool) -> bool {
        match self {
            Self::None | Self::Delta => false,
            Self::Constant => !mandatory,
            Self::Default | Self::Copy | Self::Increment | Self::Tail => true,
        }
    }

    /// Returns true if the operator can be applied to a field of this type.
    #[must_use]
    pub const fn applies_to(&self, value_type: ValueType) -> bool {
        match self {
            Self::None | Self::Constant | Self::Default | Self::Copy | Self::Delta => {
                !value_type.is_composite()
            }
            Self::Increment => value_type.is_integer(),
            Self::Tail => value_type.is_byte_like(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dictionary scope for operator state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DictionaryScope {
    /// Global dictionary shared across all templates.
    #[default]
    Global,
    /// Template-specific dictionary.
    Template,
    /// Dictionary shared by templates of the same application type.
    Type(String),
    /// Explicitly named dictionary.
    Named(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_uses_presence_bit() {
        assert!(!Operator::None.uses_presence_bit(false));
        assert!(!Operator::Constant.uses_presence_bit(true));
        assert!(Operator::Constant.uses_presence_bit(false));
        assert!(Operator::Default.uses_presence_bit(true));
        assert!(Operator::Copy.uses_presence_bit(true));
        assert!(!Operator::Delta.uses_presence_bit(false));
    }

    #[test]
    fn test_operator_applicability() {
        assert!(Operator::Increment.applies_to(ValueType::UInt32));
        assert!(!Operator::Increment.applies_to(ValueType::Ascii));
        assert!(Operator::Tail.applies_to(ValueType::ByteVector));
        assert!(!Operator::Tail.applies_to(ValueType::Decimal));
        assert!(Operator::Delta.applies_to(ValueType::Decimal));
        assert!(!Operator::Copy.applies_to(ValueType::Group));
    }
}
