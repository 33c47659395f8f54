/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Template registry.

use std::collections::HashMap;
use std::sync::Arc;

use ironfast_core::error::TemplateDefinitionError;

use crate::segment::Template;

/// Templates by id.
///
/// Built once, then shared behind an `Arc` by any number of decoders and
/// encoders.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<u32, Arc<Template>>,
    max_template_bits: usize,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template.
    ///
    /// # Errors
    /// Returns `DuplicateTemplate` if the id is already registered.
    pub fn register(&mut self, template: Template) -> Result<(), TemplateDefinitionError> {
        let id = template.id();
        if self.templates.contains_key(&id) {
            return Err(TemplateDefinitionError::DuplicateTemplate(id));
        }
        self.max_template_bits = self
            .max_template_bits
            .max(template.body().presence_map_bits());
        self.templates.insert(id, Arc::new(template));
        Ok(())
    }

    /// Builder form of [`TemplateRegistry::register`].
    ///
    /// # Errors
    /// Returns `DuplicateTemplate` if the id is already registered.
    pub fn with_template(mut self, template: Template) -> Result<Self, TemplateDefinitionError> {
        self.register(template)?;
        Ok(self)
    }

    /// Looks up a template.
    #[inline]
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Arc<Template>> {
        self.templates.get(&id)
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterates over the templates in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Template>> {
        self.templates.values()
    }

    /// Size of a message-level presence map: the template id bit plus the
    /// largest template's bits.
    #[must_use]
    pub const fn presence_map_bits(&self) -> usize {
        self.max_template_bits + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::FieldInstruction;
    use crate::operators::Operator;
    use crate::segment::SegmentBody;
    use ironfast_core::identity::FieldIdentity;
    use ironfast_core::value::ValueType;

    fn template(id: u32, copies: usize) -> Template {
        let instructions = (0..copies)
            .map(|i| {
                FieldInstruction::new(FieldIdentity::local(format!("F{i}")), ValueType::UInt32)
                    .with_operator(Operator::Copy)
            })
            .collect();
        Template::new(id, format!("T{id}"), SegmentBody::new(instructions).unwrap())
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TemplateRegistry::new()
            .with_template(template(1, 2))
            .unwrap()
            .with_template(template(2, 5))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).map(|t| t.name()), Some("T1"));
        assert!(registry.get(3).is_none());
        assert_eq!(registry.presence_map_bits(), 6);
    }

    #[test]
    fn test_duplicate_template() {
        let mut registry = TemplateRegistry::new();
        registry.register(template(1, 0)).unwrap();
        assert_eq!(
            registry.register(template(1, 1)),
            Err(TemplateDefinitionError::DuplicateTemplate(1))
        );
        assert_eq!(registry.presence_map_bits(), 1);
    }
}
