/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFAST Schema
//!
//! Serializable template definitions for the IronFAST codec.
//!
//! This crate provides:
//! - **Schema definitions**: Template, field and operator definitions that a
//!   template-file parser can produce or that serde can load directly
//! - **Registry building**: Validated conversion into a
//!   [`ironfast_codec::TemplateRegistry`], parsing initial values per field type

pub mod builder;
pub mod schema;

pub use builder::parse_initial_value;
pub use schema::{FieldDef, OperatorDef, Presence, TemplateDef, TemplateSet};
