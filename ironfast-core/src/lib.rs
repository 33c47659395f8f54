/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFAST Core
//!
//! Core types and error definitions for the IronFAST codec.
//!
//! This crate provides the value model shared by the codec and the schema layer:
//! - **Error types**: [`FastError`] with the encoding / template-definition split
//! - **Identities**: [`FieldIdentity`], shared by instructions, field sets and dictionaries
//! - **Values**: [`FieldValue`], [`ValueType`] and the scaled [`Decimal`]
//! - **Containers**: [`FieldSet`], [`Sequence`] and [`Message`]
//!
//! ## Sharing
//!
//! Values are immutable. Strings, byte vectors and nested field sets are held
//! behind `Arc`/`Bytes`, so a value stored in a dictionary and the same value
//! in a decoded field set share one allocation.

pub mod decimal;
pub mod error;
pub mod field_set;
pub mod identity;
pub mod value;

pub use decimal::{Decimal, DecimalRangeError, ParseDecimalError};
pub use error::{EncodingError, FastError, Result, TemplateDefinitionError};
pub use field_set::{FieldEntry, FieldSet, Message, Sequence};
pub use identity::FieldIdentity;
pub use value::{FieldValue, ValueType};
