/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFAST Codec
//!
//! FAST (FIX Adapted for STreaming) message encoding and decoding.
//!
//! FAST is a binary encoding used for high-volume market data feeds. It
//! compresses messages with stop-bit integers, presence maps and stateful
//! field operators driven by externally supplied templates.
//!
//! ## Features
//!
//! - **Stop-bit primitives**: integers, ASCII, Unicode and byte vectors
//! - **Presence maps**: one per segment, consumed in instruction order
//! - **Field operators**: constant, default, copy, increment, delta and tail
//! - **Dictionaries**: global, per-template, per-type and named scopes
//! - **Nesting**: groups and sequences with their own presence maps
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use ironfast_codec::{Decoder, Encoder, FieldInstruction, Operator, SegmentBody, SliceSource, Template, TemplateRegistry};
//! use ironfast_core::{FieldIdentity, FieldSet, ValueType};
//!
//! let body = SegmentBody::new(vec![
//!     FieldInstruction::new(FieldIdentity::local("MsgSeqNum"), ValueType::UInt32)
//!         .with_operator(Operator::Increment),
//! ])?;
//! let registry = Arc::new(TemplateRegistry::new().with_template(Template::new(1, "Heartbeat", body))?);
//!
//! let fields = FieldSet::new().with_field(Arc::new(FieldIdentity::local("MsgSeqNum")), 10u32);
//! let mut bytes = Vec::new();
//! Encoder::new(Arc::clone(&registry)).encode_message(&mut bytes, 1, &fields)?;
//!
//! let message = Decoder::new(registry).decode_message(&mut SliceSource::new(&bytes))?;
//! assert_eq!(message.map(|m| m.into_fields()), Some(fields));
//! # Ok::<(), ironfast_core::FastError>(())
//! ```

pub mod context;
pub mod decoder;
pub mod destination;
pub mod dictionary;
pub mod encoder;
mod field_codec;
pub mod instruction;
pub mod operators;
pub mod pmap;
pub mod primitives;
pub mod registry;
pub mod segment;
pub mod source;

pub use context::{CodecConfig, Context};
pub use decoder::Decoder;
pub use destination::DataDestination;
pub use dictionary::{Dictionary, DictionarySet, DictionaryValue};
pub use encoder::Encoder;
pub use instruction::{FieldInstruction, InstructionKind};
pub use operators::{DictionaryScope, Operator};
pub use pmap::PresenceMap;
pub use registry::TemplateRegistry;
pub use segment::{SegmentBody, Template};
pub use source::{DataSource, SliceSource};
