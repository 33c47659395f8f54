/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field identities.
//!
//! A [`FieldIdentity`] names a field independently of its type and value so
//! that immutable values can be shared between field sets and dictionaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between namespace and local name in a qualified name.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Identity of a field within a field set.
///
/// Created once per template definition and shared behind an `Arc` by every
/// instruction, field set entry and dictionary that refers to the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldIdentity {
    local_name: String,
    namespace: String,
    qualified_name: String,
    id: Option<u32>,
    mandatory: bool,
}

impl FieldIdentity {
    /// Creates a mandatory identity.
    ///
    /// # Arguments
    /// * `name` - The local name of the field
    /// * `namespace` - The namespace in which the name is defined (may be empty)
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let local_name = name.into();
        let namespace = namespace.into();
        let qualified_name = qualify(&local_name, &namespace);
        Self {
            local_name,
            namespace,
            qualified_name,
            id: None,
            mandatory: true,
        }
    }

    /// Creates a mandatory identity with no namespace.
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    /// Sets the numeric field id.
    #[must_use]
    pub const fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the mandatory flag.
    #[must_use]
    pub const fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Marks the field optional.
    #[must_use]
    pub const fn optional(self) -> Self {
        self.with_mandatory(false)
    }

    /// Returns the qualified name (`namespace::local`, or `local`).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.qualified_name
    }

    /// Returns the unqualified name.
    #[inline]
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns the namespace.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the numeric field id, if one was assigned.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> Option<u32> {
        self.id
    }

    /// Returns true if the field must appear in the application data.
    #[inline]
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Derives the identity of a synthetic child field, such as a decimal
    /// component or a sequence length.
    ///
    /// The child keeps the namespace and appends `suffix` to the local name.
    #[must_use]
    pub fn derive(&self, suffix: &str, mandatory: bool) -> Self {
        Self::new(format!("{}|{}", self.local_name, suffix), self.namespace.clone())
            .with_mandatory(mandatory)
    }
}

impl fmt::Display for FieldIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

fn qualify(local_name: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        local_name.to_string()
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}{local_name}")
    }
}
