/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFAST
//!
//! A FAST (FIX Adapted for STreaming) codec for Rust.
//!
//! IronFAST converts compact FAST byte streams into structured field sets and
//! back, driven by templates that assign every field a type and an operator.
//!
//! ## Features
//!
//! - **Complete operator set**: constant, default, copy, increment, delta and tail
//! - **Stateful dictionaries**: global, template, type and named scopes
//! - **Nested data**: groups and sequences with their own presence maps
//! - **Shared values**: strings, byte vectors and nested sets are `Arc`-shared
//! - **Strict or lenient**: reject or tolerate nonconforming data
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ironfast::prelude::*;
//!
//! let registry = TemplateSet::new()
//!     .with_template(TemplateDef::new(
//!         1,
//!         "Heartbeat",
//!         vec![FieldDef::new("MsgSeqNum", ValueType::UInt32)
//!             .with_operator(OperatorDef::new(Operator::Increment))],
//!     ))
//!     .build()?;
//! let registry = Arc::new(registry);
//!
//! let mut decoder = Decoder::new(registry);
//! let mut source = SliceSource::new(&[0xE0, 0x81, 0x81, 0x80]);
//! let messages = decoder.decode_all(&mut source)?;
//! assert_eq!(messages[1].get_field("MsgSeqNum"), Some(&FieldValue::UInt32(2)));
//! # Ok::<(), FastError>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Values, field sets and error definitions
//! - [`codec`]: Wire primitives, operators, dictionaries, decoder and encoder
//! - [`schema`]: Serializable template definitions

pub mod core {
    //! Values, field sets and error definitions.
    pub use ironfast_core::*;
}

pub mod codec {
    //! Wire primitives, operators, dictionaries, decoder and encoder.
    pub use ironfast_codec::*;
}

pub mod schema {
    //! Serializable template definitions.
    pub use ironfast_schema::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ironfast_core::{
        Decimal, EncodingError, FastError, FieldIdentity, FieldSet, FieldValue, Message, Result,
        Sequence, TemplateDefinitionError, ValueType,
    };

    // Codec
    pub use ironfast_codec::{
        CodecConfig, DataDestination, DataSource, Decoder, DictionaryScope, Encoder,
        FieldInstruction, Operator, SegmentBody, SliceSource, Template, TemplateRegistry,
    };

    // Schema
    pub use ironfast_schema::{FieldDef, OperatorDef, Presence, TemplateDef, TemplateSet};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    const TEMPLATES: &str = r#"{
        "templates": [
            {
                "id": 1,
                "name": "Quote",
                "dictionary": "Template",
                "fields": [
                    {
                        "name": "Seq",
                        "field_type": "UInt32",
                        "operator": { "operator": "Increment" }
                    },
                    {
                        "name": "Symbol",
                        "field_type": "Ascii",
                        "operator": { "operator": "Copy" }
                    },
                    {
                        "name": "Px",
                        "field_type": "Decimal",
                        "presence": "optional",
                        "exponent": { "operator": "Default", "value": "-2" },
                        "mantissa": { "operator": "Delta" }
                    },
                    {
                        "name": "Venue",
                        "field_type": "Ascii",
                        "operator": { "operator": "Constant", "value": "XCME" }
                    }
                ]
            }
        ]
    }"#;

    fn quote(seq: u32, symbol: &str, px: Option<i64>) -> FieldSet {
        let mut fields = FieldSet::new()
            .with_field(Arc::new(FieldIdentity::local("Seq")), seq)
            .with_field(Arc::new(FieldIdentity::local("Symbol")), FieldValue::ascii(symbol));
        if let Some(mantissa) = px {
            fields = fields.with_field(
                Arc::new(FieldIdentity::local("Px").optional()),
                Decimal::new(mantissa, -2),
            );
        }
        fields.with_field(Arc::new(FieldIdentity::local("Venue")), FieldValue::ascii("XCME"))
    }

    #[test]
    fn test_prelude_imports() {
        let _config = CodecConfig::default().with_strict(false);
        let _registry = TemplateRegistry::new();
        let _decimal = Decimal::new(1, 0);
        assert_eq!(Operator::default(), Operator::None);
    }

    #[test]
    fn test_schema_driven_round_trip() {
        let set: TemplateSet = serde_json::from_str(TEMPLATES).unwrap();
        let registry = Arc::new(set.build().unwrap());
        let messages = [
            quote(1, "ESZ6", Some(512_525)),
            quote(2, "ESZ6", Some(512_550)),
            quote(3, "ESZ6", None),
        ];

        let mut encoder = Encoder::new(Arc::clone(&registry));
        let mut bytes = Vec::new();
        for fields in &messages {
            encoder.encode_message(&mut bytes, 1, fields).unwrap();
        }

        let mut decoder = Decoder::new(registry);
        let mut source = SliceSource::new(&bytes);
        let decoded = decoder.decode_all(&mut source).unwrap();
        let fields: Vec<FieldSet> = decoded.into_iter().map(Message::into_fields).collect();
        assert_eq!(fields, messages);
    }
}
