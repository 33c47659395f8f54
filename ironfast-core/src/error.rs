/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the IronFAST codec.
//!
//! Errors fall into two categories:
//! - [`EncodingError`]: the byte stream or the application data does not
//!   conform to the template (truncated input, missing mandatory fields,
//!   unknown template ids, ...).
//! - [`TemplateDefinitionError`]: the templates themselves are inconsistent,
//!   either at construction time or when dictionary state reveals a conflict.
//!
//! Messages embed the short FAST error tags (`[ERR D4]`, `[ERR D9]`, ...).

use crate::value::ValueType;
use thiserror::Error;

/// Result type alias using [`FastError`] as the error type.
pub type Result<T> = std::result::Result<T, FastError>;

/// Top-level error type for all IronFAST operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FastError {
    /// Malformed data or application values.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Inconsistent template definitions.
    #[error("template definition error: {0}")]
    TemplateDefinition(#[from] TemplateDefinitionError),
}

impl FastError {
    /// Returns true if this is an [`EncodingError`].
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }

    /// Returns true if this is a [`TemplateDefinitionError`].
    #[must_use]
    pub const fn is_template_definition(&self) -> bool {
        matches!(self, Self::TemplateDefinition(_))
    }
}

/// Errors caused by the byte stream or the application data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The source ended inside a message.
    #[error("unexpected end of input in {context}")]
    UnexpectedEof {
        /// What was being decoded.
        context: &'static str,
    },

    /// A decoded integer does not fit the field's width.
    #[error("integer overflow decoding {type_name}")]
    IntegerOverflow {
        /// Name of the target integer type.
        type_name: &'static str,
    },

    /// A string field contained bytes that are not valid for its encoding.
    #[error("invalid string encoding in field {name}")]
    InvalidString {
        /// Qualified field name.
        name: String,
    },

    /// A decimal exponent fell outside the permitted range.
    #[error("decimal exponent {exponent} out of range in field {name}")]
    ExponentOutOfRange {
        /// Qualified field name.
        name: String,
        /// The offending exponent.
        exponent: i64,
    },

    /// A mandatory field was neither in the stream nor derivable.
    #[error("[ERR D5] missing mandatory field: {name}")]
    MissingMandatoryField {
        /// Qualified field name.
        name: String,
    },

    /// The template id does not name a registered template.
    #[error("[ERR D9] unknown template id: {0}")]
    UnknownTemplate(u32),

    /// The first message of a stream did not carry a template id.
    #[error("no template id in presence map and no previous template")]
    MissingTemplateId,

    /// Application data disagrees with a constant operator.
    #[error("constant value does not match application data for field {name}")]
    ConstantMismatch {
        /// Qualified field name.
        name: String,
    },

    /// Application data has a different type than the field.
    #[error("field {name} expects {expected}, got {actual}")]
    TypeMismatch {
        /// Qualified field name.
        name: String,
        /// Type declared by the template.
        expected: ValueType,
        /// Type supplied by the application.
        actual: ValueType,
    },

    /// Application data contains a field the template does not declare.
    #[error("field {name} is not part of the template")]
    UnknownField {
        /// Qualified field name.
        name: String,
    },

    /// A presence map carried more set bits than the segment declares.
    #[error("presence map overlong: {bits} bits for a segment of {capacity}")]
    PresenceMapOverlong {
        /// Highest set bit position plus one.
        bits: usize,
        /// Bits declared by the segment.
        capacity: usize,
    },

    /// A value cannot be expressed with the tail operator.
    #[error("value of field {name} cannot be tail encoded")]
    NotTailEncodable {
        /// Qualified field name.
        name: String,
    },

    /// A sequence or byte vector length exceeds what the wire format allows.
    #[error("length {length} too large in field {name}")]
    LengthTooLarge {
        /// Qualified field name.
        name: String,
        /// The offending length.
        length: usize,
    },
}

/// Errors in template definitions or dictionary usage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateDefinitionError {
    /// A dictionary entry holds a value of a different type than expected.
    #[error("[ERR D4] previous value type mismatch for key {key}: expected {expected}, found {found}")]
    DictionaryTypeMismatch {
        /// Dictionary key.
        key: String,
        /// Type expected by the instruction.
        expected: ValueType,
        /// Type stored in the dictionary.
        found: ValueType,
    },

    /// A mandatory field's dictionary entry is known to be absent.
    #[error("[ERR D6] mandatory field is missing: {name}")]
    MandatoryFieldEmpty {
        /// Qualified field name.
        name: String,
    },

    /// The operator cannot be applied to the field's type.
    #[error("[ERR S2] operator {operator} not applicable to {value_type} field {name}")]
    OperatorNotApplicable {
        /// Qualified field name.
        name: String,
        /// Operator name.
        operator: &'static str,
        /// Field type.
        value_type: ValueType,
    },

    /// A constant operator was declared without a value.
    #[error("[ERR S4] constant operator without a value for field {name}")]
    MissingConstantValue {
        /// Qualified field name.
        name: String,
    },

    /// An initial value does not match the field's type.
    #[error("[ERR S3] initial value of field {name} is {actual}, expected {expected}")]
    InitialValueType {
        /// Qualified field name.
        name: String,
        /// Field type.
        expected: ValueType,
        /// Initial value type.
        actual: ValueType,
    },

    /// An initial value's text could not be interpreted.
    #[error("[ERR S3] invalid initial value {value:?} for field {name}")]
    InvalidInitialValue {
        /// Qualified field name.
        name: String,
        /// The text that failed to parse.
        value: String,
    },

    /// Two templates share an id.
    #[error("duplicate template id: {0}")]
    DuplicateTemplate(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_template_display() {
        let err = EncodingError::UnknownTemplate(42);
        assert_eq!(err.to_string(), "[ERR D9] unknown template id: 42");
    }

    #[test]
    fn test_fast_error_from_encoding() {
        let err: FastError = EncodingError::MissingTemplateId.into();
        assert!(err.is_encoding());
        assert!(!err.is_template_definition());
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = TemplateDefinitionError::DictionaryTypeMismatch {
            key: "Price".to_string(),
            expected: ValueType::Decimal,
            found: ValueType::UInt32,
        };
        assert_eq!(
            err.to_string(),
            "[ERR D4] previous value type mismatch for key Price: expected decimal, found uInt32"
        );
        let err: FastError = err.into();
        assert!(err.is_template_definition());
    }
}
