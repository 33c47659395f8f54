/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Schema definitions for FAST templates.
//!
//! These structures mirror a FAST template file:
//! - [`OperatorDef`]: Operator with its initial value, dictionary and key
//! - [`FieldDef`]: Scalar, decimal, group or sequence field
//! - [`TemplateDef`]: Numbered template
//! - [`TemplateSet`]: Every template of one stream
//!
//! Initial values are carried as text and parsed against the field type when
//! the set is built into a registry.

use ironfast_codec::operators::{DictionaryScope, Operator};
use ironfast_core::value::ValueType;
use serde::{Deserialize, Serialize};

/// Field presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// The field is always present in the application data.
    #[default]
    Mandatory,
    /// The field may be absent.
    Optional,
}

impl Presence {
    /// Returns true for [`Presence::Mandatory`].
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        matches!(self, Self::Mandatory)
    }
}

/// An operator element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorDef {
    /// The operator.
    pub operator: Operator,
    /// Initial value text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Dictionary scope; inherited from the template when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<DictionaryScope>,
    /// Dictionary key; the qualified field name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl OperatorDef {
    /// Creates an operator definition.
    #[must_use]
    pub const fn new(operator: Operator) -> Self {
        Self {
            operator,
            value: None,
            dictionary: None,
            key: None,
        }
    }

    /// Sets the initial value text.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the dictionary scope.
    #[must_use]
    pub fn with_dictionary(mut self, dictionary: DictionaryScope) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Sets the dictionary key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Definition of a template field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Local field name.
    pub name: String,
    /// Field namespace.
    #[serde(default)]
    pub namespace: String,
    /// Numeric field id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Field presence.
    #[serde(default)]
    pub presence: Presence,
    /// Field type.
    pub field_type: ValueType,
    /// Operator of a scalar field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorDef>,
    /// Exponent operator; makes a decimal field a split decimal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<OperatorDef>,
    /// Mantissa operator; makes a decimal field a split decimal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mantissa: Option<OperatorDef>,
    /// Length field of a sequence; an implicit `uInt32` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<Box<FieldDef>>,
    /// Nested fields of a group or sequence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
}

impl FieldDef {
    /// Creates a mandatory field without an operator.
    ///
    /// # Arguments
    /// * `name` - The local field name
    /// * `field_type` - The field type
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: ValueType) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            id: None,
            presence: Presence::Mandatory,
            field_type,
            operator: None,
            exponent: None,
            mantissa: None,
            length: None,
            fields: Vec::new(),
        }
    }

    /// Creates a group.
    #[must_use]
    pub fn group(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            fields,
            ..Self::new(name, ValueType::Group)
        }
    }

    /// Creates a sequence.
    #[must_use]
    pub fn sequence(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            fields,
            ..Self::new(name, ValueType::Sequence)
        }
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the numeric field id.
    #[must_use]
    pub const fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Marks the field optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    /// Sets the operator.
    #[must_use]
    pub fn with_operator(mut self, operator: OperatorDef) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Splits a decimal into separately operated exponent and mantissa.
    #[must_use]
    pub fn with_split(mut self, exponent: OperatorDef, mantissa: OperatorDef) -> Self {
        self.exponent = Some(exponent);
        self.mantissa = Some(mantissa);
        self
    }

    /// Sets the explicit length field of a sequence.
    #[must_use]
    pub fn with_length(mut self, length: FieldDef) -> Self {
        self.length = Some(Box::new(length));
        self
    }

    /// Returns true if the field is a split decimal.
    #[must_use]
    pub const fn is_split_decimal(&self) -> bool {
        matches!(self.field_type, ValueType::Decimal)
            && (self.exponent.is_some() || self.mantissa.is_some())
    }
}

/// Definition of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    /// Template id.
    pub id: u32,
    /// Template name.
    pub name: String,
    /// Template namespace.
    #[serde(default)]
    pub namespace: String,
    /// Clears the template dictionary before every message.
    #[serde(default)]
    pub reset: bool,
    /// Default dictionary scope of the template's fields.
    #[serde(default)]
    pub dictionary: DictionaryScope,
    /// Template fields in wire order.
    pub fields: Vec<FieldDef>,
}

impl TemplateDef {
    /// Creates a template definition.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            id,
            name: name.into(),
            namespace: String::new(),
            reset: false,
            dictionary: DictionaryScope::Global,
            fields,
        }
    }

    /// Sets the template namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the reset flag.
    #[must_use]
    pub const fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Sets the default dictionary scope.
    #[must_use]
    pub fn with_dictionary(mut self, dictionary: DictionaryScope) -> Self {
        self.dictionary = dictionary;
        self
    }
}

/// All templates of one stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateSet {
    /// The templates.
    pub templates: Vec<TemplateDef>,
}

impl TemplateSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template definition.
    pub fn add_template(&mut self, template: TemplateDef) {
        self.templates.push(template);
    }

    /// Builder form of [`TemplateSet::add_template`].
    #[must_use]
    pub fn with_template(mut self, template: TemplateDef) -> Self {
        self.templates.push(template);
        self
    }

    /// Gets a template definition by id.
    #[must_use]
    pub fn get_template(&self, id: u32) -> Option<&TemplateDef> {
        self.templates.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_default() {
        assert_eq!(Presence::default(), Presence::Mandatory);
        assert!(Presence::Mandatory.is_mandatory());
        assert!(!Presence::Optional.is_mandatory());
    }

    #[test]
    fn test_field_def_builders() {
        let field = FieldDef::new("Px", ValueType::Decimal)
            .with_namespace("md")
            .with_id(44)
            .optional()
            .with_split(OperatorDef::new(Operator::Copy), OperatorDef::new(Operator::Delta));

        assert_eq!(field.namespace, "md");
        assert_eq!(field.id, Some(44));
        assert_eq!(field.presence, Presence::Optional);
        assert!(field.is_split_decimal());
        assert!(!FieldDef::new("Px", ValueType::Decimal).is_split_decimal());
    }

    #[test]
    fn test_template_set_lookup() {
        let set = TemplateSet::new()
            .with_template(TemplateDef::new(1, "A", Vec::new()))
            .with_template(TemplateDef::new(2, "B", Vec::new()).with_reset(true));

        assert_eq!(set.get_template(2).map(|t| t.name.as_str()), Some("B"));
        assert!(set.get_template(2).is_some_and(|t| t.reset));
        assert!(set.get_template(3).is_none());
    }

    #[test]
    fn test_deserialize_minimal_field() {
        let field: FieldDef = serde_json::from_str(
            r#"{
                "name": "Seq",
                "field_type": "UInt32",
                "operator": { "operator": "Increment", "value": "1" }
            }"#,
        )
        .unwrap();

        assert_eq!(field.presence, Presence::Mandatory);
        assert_eq!(field.namespace, "");
        assert_eq!(
            field.operator,
            Some(OperatorDef::new(Operator::Increment).with_value("1"))
        );
        assert!(field.fields.is_empty());
    }

    #[test]
    fn test_serialize_round_trip() {
        let template = TemplateDef::new(
            3,
            "Book",
            vec![
                FieldDef::new("Sym", ValueType::Ascii).with_operator(
                    OperatorDef::new(Operator::Copy).with_dictionary(DictionaryScope::Template),
                ),
                FieldDef::sequence("Levels", vec![FieldDef::new("Px", ValueType::Int64)])
                    .optional(),
            ],
        );
        let text = serde_json::to_string(&template).unwrap();
        let parsed: TemplateDef = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, template);
    }
}
