/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Operator dictionaries.
//!
//! Copy, increment, delta and tail operators remember the last value seen for
//! a key. A key that was never written is *undefined* (absent from the map);
//! a key whose last value was null is [`DictionaryValue::Empty`].

use crate::operators::DictionaryScope;
use ironfast_core::value::{FieldValue, ValueType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// State of a defined dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryValue {
    /// The last value for the key was null.
    Empty(ValueType),
    /// The last value for the key.
    Assigned(FieldValue),
}

impl DictionaryValue {
    /// Returns the type of the stored value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Empty(t) => *t,
            Self::Assigned(v) => v.value_type(),
        }
    }
}

/// A single dictionary: key to last value.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<Arc<str>, DictionaryValue>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a key. `None` means the key is undefined.
    #[inline]
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&DictionaryValue> {
        self.entries.get(key)
    }

    /// Inserts or overwrites the value for a key.
    #[inline]
    pub fn add(&mut self, key: &Arc<str>, value: DictionaryValue) {
        if let Some(slot) = self.entries.get_mut(&**key) {
            *slot = value;
        } else {
            self.entries.insert(Arc::clone(key), value);
        }
    }

    /// Makes every key undefined again.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of defined keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All dictionaries owned by one decoder or encoder.
///
/// Resolves a [`DictionaryScope`] to the dictionary instance it names. The
/// set is passed explicitly to every instruction, so two codecs never share
/// state.
#[derive(Debug, Clone, Default)]
pub struct DictionarySet {
    global: Dictionary,
    templates: HashMap<u32, Dictionary>,
    types: HashMap<String, Dictionary>,
    named: HashMap<String, Dictionary>,
}

impl DictionarySet {
    /// Creates an empty set of dictionaries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dictionary for `scope`, creating it on first use.
    ///
    /// # Arguments
    /// * `scope` - The instruction's dictionary scope
    /// * `template_id` - The template of the message being processed
    pub fn resolve(&mut self, scope: &DictionaryScope, template_id: u32) -> &mut Dictionary {
        match scope {
            DictionaryScope::Global => &mut self.global,
            DictionaryScope::Template => self.templates.entry(template_id).or_default(),
            DictionaryScope::Type(name) => named_entry(&mut self.types, name),
            DictionaryScope::Named(name) => named_entry(&mut self.named, name),
        }
    }

    /// Returns the dictionary for `scope` if it has been created.
    #[must_use]
    pub fn get(&self, scope: &DictionaryScope, template_id: u32) -> Option<&Dictionary> {
        match scope {
            DictionaryScope::Global => Some(&self.global),
            DictionaryScope::Template => self.templates.get(&template_id),
            DictionaryScope::Type(name) => self.types.get(name),
            DictionaryScope::Named(name) => self.named.get(name),
        }
    }

    /// Returns the global dictionary.
    #[must_use]
    pub const fn global(&self) -> &Dictionary {
        &self.global
    }

    /// Clears the template-scope dictionary of one template.
    pub fn reset_template(&mut self, template_id: u32) {
        if let Some(dictionary) = self.templates.get_mut(&template_id) {
            debug!(template_id, "resetting template dictionary");
            dictionary.reset();
        }
    }

    /// Clears one named dictionary.
    pub fn reset_named(&mut self, name: &str) {
        if let Some(dictionary) = self.named.get_mut(name) {
            debug!(name, "resetting named dictionary");
            dictionary.reset();
        }
    }

    /// Clears every dictionary.
    pub fn reset(&mut self) {
        debug!("resetting all dictionaries");
        self.global.reset();
        self.templates.clear();
        self.types.clear();
        self.named.clear();
    }
}

fn named_entry<'a>(map: &'a mut HashMap<String, Dictionary>, name: &str) -> &'a mut Dictionary {
    map.entry(name.to_owned()).or_default()
}
