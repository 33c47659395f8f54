/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Conversion of schema definitions into codec templates.

use std::sync::Arc;

use ironfast_codec::instruction::FieldInstruction;
use ironfast_codec::operators::DictionaryScope;
use ironfast_codec::registry::TemplateRegistry;
use ironfast_codec::segment::{SegmentBody, Template};
use ironfast_core::decimal::Decimal;
use ironfast_core::error::TemplateDefinitionError;
use ironfast_core::identity::FieldIdentity;
use ironfast_core::value::{FieldValue, ValueType};
use tracing::debug;

use crate::schema::{FieldDef, OperatorDef, TemplateDef, TemplateSet};

type BuildResult<T> = Result<T, TemplateDefinitionError>;

impl TemplateSet {
    /// Builds a registry holding every template of the set.
    ///
    /// # Errors
    /// Returns the first definition error: an operator that does not apply
    /// to its field, an unparsable initial value, a duplicate template id.
    pub fn build(&self) -> BuildResult<TemplateRegistry> {
        let mut registry = TemplateRegistry::new();
        for def in &self.templates {
            registry.register(def.build()?)?;
        }
        debug!(templates = registry.len(), "built template registry");
        Ok(registry)
    }
}

impl TemplateDef {
    /// Builds the codec template.
    ///
    /// # Errors
    /// Returns the first definition error among the fields.
    pub fn build(&self) -> BuildResult<Template> {
        let body = build_body(&self.fields, &self.dictionary)?;
        Ok(Template::new(self.id, self.name.clone(), body)
            .with_namespace(self.namespace.clone())
            .with_reset(self.reset))
    }
}

impl FieldDef {
    /// Builds the field instruction.
    ///
    /// # Arguments
    /// * `dictionary` - Scope used when the operator names none
    ///
    /// # Errors
    /// Returns the first definition error in this field or its children.
    pub fn build(&self, dictionary: &DictionaryScope) -> BuildResult<FieldInstruction> {
        let mut identity = FieldIdentity::new(self.name.clone(), self.namespace.clone())
            .with_mandatory(self.presence.is_mandatory());
        if let Some(id) = self.id {
            identity = identity.with_id(id);
        }

        let instruction = match self.field_type {
            ValueType::Group => {
                let body = build_body(&self.fields, dictionary)?;
                FieldInstruction::group(identity, Arc::new(body))
            }
            ValueType::Sequence => {
                let length = match &self.length {
                    Some(length) if length.presence != self.presence => FieldDef {
                        presence: self.presence,
                        ..(**length).clone()
                    }
                    .build(dictionary)?,
                    Some(length) => length.build(dictionary)?,
                    None => FieldInstruction::new(
                        identity.derive("length", identity.is_mandatory()),
                        ValueType::UInt32,
                    ),
                };
                let body = build_body(&self.fields, dictionary)?;
                FieldInstruction::sequence(identity, length, Arc::new(body))
            }
            ValueType::Decimal if self.is_split_decimal() => {
                return self.build_split_decimal(identity, dictionary);
            }
            value_type => FieldInstruction::new(identity, value_type),
        };

        match &self.operator {
            Some(def) => apply_operator(instruction, def, dictionary),
            None => Ok(instruction.with_dictionary(dictionary.clone())),
        }
    }

    fn build_split_decimal(
        &self,
        identity: FieldIdentity,
        dictionary: &DictionaryScope,
    ) -> BuildResult<FieldInstruction> {
        let none = OperatorDef::default();
        let exponent = self.exponent.as_ref().unwrap_or(&none);
        let mantissa = self.mantissa.as_ref().unwrap_or(&none);

        let mut instruction =
            FieldInstruction::split_decimal(identity, exponent.operator, mantissa.operator)
                .with_dictionary(dictionary.clone());
        if let Some(def) = &self.operator {
            instruction = instruction.with_operator(def.operator);
        }

        let exponent_value = parse_component(&instruction, exponent, ValueType::Int32)?;
        let mantissa_value = parse_component(&instruction, mantissa, ValueType::Int64)?;
        Ok(instruction
            .map_exponent(|e| apply_component(e, exponent, exponent_value))
            .map_mantissa(|m| apply_component(m, mantissa, mantissa_value)))
    }
}

fn build_body(fields: &[FieldDef], dictionary: &DictionaryScope) -> BuildResult<SegmentBody> {
    let instructions = fields
        .iter()
        .map(|field| field.build(dictionary))
        .collect::<BuildResult<Vec<_>>>()?;
    SegmentBody::new(instructions)
}

fn apply_operator(
    instruction: FieldInstruction,
    def: &OperatorDef,
    dictionary: &DictionaryScope,
) -> BuildResult<FieldInstruction> {
    let mut instruction = instruction
        .with_operator(def.operator)
        .with_dictionary(def.dictionary.clone().unwrap_or_else(|| dictionary.clone()));
    if let Some(key) = &def.key {
        instruction = instruction.with_key(key);
    }
    if let Some(text) = &def.value {
        let value = parse_initial_value(instruction.name(), instruction.value_type(), text)?;
        instruction = instruction.with_initial_value(value);
    }
    Ok(instruction)
}

fn parse_component(
    decimal: &FieldInstruction,
    def: &OperatorDef,
    value_type: ValueType,
) -> BuildResult<Option<FieldValue>> {
    def.value
        .as_deref()
        .map(|text| parse_initial_value(decimal.name(), value_type, text))
        .transpose()
}

fn apply_component(
    component: FieldInstruction,
    def: &OperatorDef,
    value: Option<FieldValue>,
) -> FieldInstruction {
    let mut component = component;
    if let Some(dictionary) = &def.dictionary {
        component = component.with_dictionary(dictionary.clone());
    }
    if let Some(key) = &def.key {
        component = component.with_key(key);
    }
    if let Some(value) = value {
        component = component.with_initial_value(value);
    }
    component
}

/// Parses the text of an initial value for a field of `value_type`.
///
/// Byte vectors are written as hexadecimal digits; whitespace between digit
/// pairs is ignored.
///
/// # Errors
/// Returns `InvalidInitialValue` if the text does not parse, and for groups
/// and sequences, which have no initial value.
pub fn parse_initial_value(
    name: &str,
    value_type: ValueType,
    text: &str,
) -> BuildResult<FieldValue> {
    let invalid = || TemplateDefinitionError::InvalidInitialValue {
        name: name.to_string(),
        value: text.to_string(),
    };
    let trimmed = text.trim();
    let value = match value_type {
        ValueType::Int32 => FieldValue::Int32(trimmed.parse().map_err(|_| invalid())?),
        ValueType::UInt32 => FieldValue::UInt32(trimmed.parse().map_err(|_| invalid())?),
        ValueType::Int64 => FieldValue::Int64(trimmed.parse().map_err(|_| invalid())?),
        ValueType::UInt64 => FieldValue::UInt64(trimmed.parse().map_err(|_| invalid())?),
        ValueType::Decimal => {
            FieldValue::Decimal(trimmed.parse::<Decimal>().map_err(|_| invalid())?)
        }
        ValueType::Ascii => {
            if !text.is_ascii() {
                return Err(invalid());
            }
            FieldValue::ascii(text)
        }
        ValueType::Unicode => FieldValue::unicode(text),
        ValueType::ByteVector => FieldValue::bytes(parse_hex(trimmed).ok_or_else(invalid)?),
        ValueType::Group | ValueType::Sequence => return Err(invalid()),
    };
    Ok(value)
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).and_then(|d| u8::try_from(d).ok()))
        .collect::<Option<_>>()?;
    if digits.len() % 2 != 0 {
        return None;
    }
    Some(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironfast_codec::instruction::InstructionKind;
    use ironfast_codec::operators::Operator;
    use ironfast_codec::{Decoder, Encoder, SliceSource};
    use ironfast_core::field_set::FieldSet;

    #[test]
    fn test_parse_initial_values() {
        assert_eq!(
            parse_initial_value("F", ValueType::Int32, " -7 ").unwrap(),
            FieldValue::Int32(-7)
        );
        assert_eq!(
            parse_initial_value("F", ValueType::UInt64, "18446744073709551615").unwrap(),
            FieldValue::UInt64(u64::MAX)
        );
        assert_eq!(
            parse_initial_value("F", ValueType::Decimal, "1.50").unwrap(),
            FieldValue::Decimal(Decimal::new(150, -2))
        );
        assert_eq!(
            parse_initial_value("F", ValueType::ByteVector, "de ad BE EF").unwrap(),
            FieldValue::bytes(vec![0xDE, 0xAD, 0xBE, 0xEF])
        );
        assert_eq!(
            parse_initial_value("F", ValueType::Ascii, " X ").unwrap(),
            FieldValue::ascii(" X ")
        );
    }

    #[test]
    fn test_parse_invalid_initial_values() {
        for (value_type, text) in [
            (ValueType::UInt32, "-1"),
            (ValueType::Int32, "abc"),
            (ValueType::Decimal, "1.2.3"),
            (ValueType::ByteVector, "abc"),
            (ValueType::Ascii, "é"),
            (ValueType::Group, ""),
        ] {
            assert_eq!(
                parse_initial_value("F", value_type, text),
                Err(TemplateDefinitionError::InvalidInitialValue {
                    name: "F".to_string(),
                    value: text.to_string(),
                })
            );
        }
    }

    #[test]
    fn test_build_scalar_with_operator() {
        let def = FieldDef::new("Seq", ValueType::UInt32)
            .with_id(34)
            .with_operator(OperatorDef::new(Operator::Increment).with_value("10").with_key("seq"));
        let instruction = def.build(&DictionaryScope::Template).unwrap();

        assert_eq!(instruction.operator(), Operator::Increment);
        assert_eq!(instruction.initial_value(), Some(&FieldValue::UInt32(10)));
        assert_eq!(instruction.dictionary(), &DictionaryScope::Template);
        assert_eq!(instruction.key(), "seq");
        assert_eq!(instruction.identity().id(), Some(34));
        assert!(instruction.is_mandatory());
    }

    #[test]
    fn test_operator_dictionary_overrides_template() {
        let def = FieldDef::new("Sym", ValueType::Ascii).optional().with_operator(
            OperatorDef::new(Operator::Copy).with_dictionary(DictionaryScope::Named("md".into())),
        );
        let instruction = def.build(&DictionaryScope::Template).unwrap();
        assert_eq!(instruction.dictionary(), &DictionaryScope::Named("md".into()));
        assert!(!instruction.is_mandatory());
    }

    #[test]
    fn test_build_split_decimal() {
        let def = FieldDef::new("Px", ValueType::Decimal).with_split(
            OperatorDef::new(Operator::Default).with_value("-2"),
            OperatorDef::new(Operator::Delta).with_key("px_mantissa"),
        );
        let instruction = def.build(&DictionaryScope::Global).unwrap();

        let InstructionKind::SplitDecimal { exponent, mantissa } = instruction.kind() else {
            panic!("expected a split decimal");
        };
        assert_eq!(exponent.operator(), Operator::Default);
        assert_eq!(exponent.initial_value(), Some(&FieldValue::Int32(-2)));
        assert_eq!(mantissa.operator(), Operator::Delta);
        assert_eq!(mantissa.key(), "px_mantissa");
        assert!(instruction.uses_presence_bit());
    }

    #[test]
    fn test_build_sequence_with_implicit_length() {
        let def = FieldDef::sequence(
            "Levels",
            vec![FieldDef::new("Px", ValueType::Int64)
                .with_operator(OperatorDef::new(Operator::Copy))],
        )
        .optional();
        let instruction = def.build(&DictionaryScope::Global).unwrap();

        let InstructionKind::Sequence { length, body } = instruction.kind() else {
            panic!("expected a sequence");
        };
        assert_eq!(length.name(), "Levels|length");
        assert_eq!(length.value_type(), ValueType::UInt32);
        assert!(!length.is_mandatory());
        assert_eq!(body.len(), 1);
        assert!(body.uses_presence_map());
    }

    #[test]
    fn test_build_sequence_length_follows_sequence_presence() {
        let def = FieldDef::sequence("Levels", vec![FieldDef::new("Px", ValueType::Int64)])
            .optional()
            .with_length(
                FieldDef::new("NoLevels", ValueType::UInt32)
                    .with_operator(OperatorDef::new(Operator::Copy)),
            );
        let instruction = def.build(&DictionaryScope::Global).unwrap();
        let InstructionKind::Sequence { length, .. } = instruction.kind() else {
            panic!("expected a sequence");
        };
        assert_eq!(length.name(), "NoLevels");
        assert_eq!(length.operator(), Operator::Copy);
        assert!(!length.is_mandatory());

        let registry = Arc::new(
            TemplateSet::new()
                .with_template(TemplateDef::new(1, "Book", vec![def]))
                .build()
                .unwrap(),
        );
        let mut out = Vec::new();
        Encoder::new(Arc::clone(&registry))
            .encode_message(&mut out, 1, &FieldSet::new())
            .unwrap();
        let message = Decoder::new(registry)
            .decode_message(&mut SliceSource::new(&out))
            .unwrap()
            .unwrap();
        assert!(message.get_field("Levels").is_none());
    }

    #[test]
    fn test_build_rejects_inapplicable_operator() {
        let set = TemplateSet::new().with_template(TemplateDef::new(
            1,
            "Bad",
            vec![FieldDef::new("Name", ValueType::Ascii)
                .with_operator(OperatorDef::new(Operator::Increment))],
        ));
        assert!(matches!(
            set.build(),
            Err(TemplateDefinitionError::OperatorNotApplicable { .. })
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_template() {
        let set = TemplateSet::new()
            .with_template(TemplateDef::new(1, "A", Vec::new()))
            .with_template(TemplateDef::new(1, "B", Vec::new()));
        assert_eq!(set.build().err(), Some(TemplateDefinitionError::DuplicateTemplate(1)));
    }

    #[test]
    fn test_build_template() {
        let def = TemplateDef::new(
            7,
            "Heartbeat",
            vec![FieldDef::new("Seq", ValueType::UInt32)
                .with_operator(OperatorDef::new(Operator::Increment))],
        )
        .with_namespace("fix")
        .with_reset(true);
        let template = def.build().unwrap();

        assert_eq!(template.id(), 7);
        assert_eq!(template.namespace(), "fix");
        assert!(template.reset());
        assert_eq!(template.body().presence_map_bits(), 1);
    }
}
