/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field sets, sequences and messages.
//!
//! This module provides:
//! - [`FieldSet`]: ordered (identity, value) pairs looked up by qualified name
//! - [`Sequence`]: the repeated field sets of a sequence field
//! - [`Message`]: a top-level field set tagged with its template id

use crate::identity::FieldIdentity;
use crate::value::FieldValue;
use smallvec::SmallVec;
use std::sync::Arc;

/// A single field in a [`FieldSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    /// Identity of the field.
    pub identity: Arc<FieldIdentity>,
    /// Value of the field.
    pub value: FieldValue,
}

impl FieldEntry {
    /// Returns the qualified name of the field.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.identity.name()
    }
}

/// Ordered collection of fields.
///
/// Entries keep insertion order. Lookup is by qualified name; field sets are
/// small, so a linear scan over inline storage beats hashing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: SmallVec<[FieldEntry; 16]>,
}

impl FieldSet {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty field set with room for `capacity` fields.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: SmallVec::with_capacity(capacity),
        }
    }

    /// Appends a field.
    ///
    /// If a field with the same qualified name exists its value is replaced
    /// in place, keeping the original position.
    pub fn add_field(&mut self, identity: Arc<FieldIdentity>, value: FieldValue) {
        if let Some(existing) = self
            .fields
            .iter_mut()
            .find(|e| e.identity.name() == identity.name())
        {
            existing.value = value;
            return;
        }
        self.fields.push(FieldEntry { identity, value });
    }

    /// Builder form of [`FieldSet::add_field`].
    #[must_use]
    pub fn with_field(mut self, identity: Arc<FieldIdentity>, value: impl Into<FieldValue>) -> Self {
        self.add_field(identity, value.into());
        self
    }

    /// Returns the value of the field with the given qualified name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|e| e.identity.name() == name)
            .map(|e| &e.value)
    }

    /// Returns the entry of the field with the given qualified name.
    #[must_use]
    pub fn get_entry(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|e| e.identity.name() == name)
    }

    /// Returns true if the field set contains the named field.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get_entry(name).is_some()
    }

    /// Removes and returns the named field's value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let pos = self.fields.iter().position(|e| e.identity.name() == name)?;
        Some(self.fields.remove(pos).value)
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Removes all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a FieldEntry;
    type IntoIter = std::slice::Iter<'a, FieldEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Entries of a sequence field.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    length_identity: Arc<FieldIdentity>,
    entries: Vec<FieldSet>,
}

impl Sequence {
    /// Creates an empty sequence.
    ///
    /// # Arguments
    /// * `length_identity` - Identity of the sequence's length field
    #[must_use]
    pub fn new(length_identity: Arc<FieldIdentity>) -> Self {
        Self {
            length_identity,
            entries: Vec::new(),
        }
    }

    /// Creates an empty sequence with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(length_identity: Arc<FieldIdentity>, capacity: usize) -> Self {
        Self {
            length_identity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the identity of the length field.
    #[must_use]
    pub fn length_identity(&self) -> &Arc<FieldIdentity> {
        &self.length_identity
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: FieldSet) {
        self.entries.push(entry);
    }

    /// Builder form of [`Sequence::push`].
    #[must_use]
    pub fn with_entry(mut self, entry: FieldSet) -> Self {
        self.push(entry);
        self
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FieldSet> {
        self.entries.get(index)
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSet> {
        self.entries.iter()
    }
}

/// A decoded message, or the input to encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    template_id: u32,
    fields: FieldSet,
}

impl Message {
    /// Creates a message for the given template.
    #[must_use]
    pub const fn new(template_id: u32, fields: FieldSet) -> Self {
        Self {
            template_id,
            fields,
        }
    }

    /// Returns the template id.
    #[inline]
    #[must_use]
    pub const fn template_id(&self) -> u32 {
        self.template_id
    }

    /// Returns the top-level fields.
    #[inline]
    #[must_use]
    pub const fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Returns the named top-level field.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get_field(name)
    }

    /// Consumes the message, returning its fields.
    #[must_use]
    pub fn into_fields(self) -> FieldSet {
        self.fields
    }
}
