/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field instructions.
//!
//! A [`FieldInstruction`] describes one field of a template: its identity,
//! its type, the operator that governs it and the dictionary entry the
//! operator uses. Instructions are immutable once built and are shared by
//! every decoder and encoder using the template.
//!
//! Operator semantics are implemented once over [`FieldValue`]; the
//! type-specific wire details live in [`crate::field_codec`].

use std::sync::Arc;

use ironfast_core::error::{EncodingError, Result, TemplateDefinitionError};
use ironfast_core::field_set::{FieldSet, Sequence};
use ironfast_core::identity::FieldIdentity;
use ironfast_core::value::{FieldValue, ValueType};

use crate::context::Context;
use crate::destination::DataDestination;
use crate::dictionary::DictionaryValue;
use crate::field_codec::{increment, int_value, zero_value, Scalar};
use crate::operators::{DictionaryScope, Operator};
use crate::pmap::PresenceMap;
use crate::segment::SegmentBody;
use crate::source::DataSource;

/// Suffix of the exponent component of a split decimal.
pub const DECIMAL_EXPONENT_SUFFIX: &str = "decimal_exponent";

/// Suffix of the mantissa component of a split decimal.
pub const DECIMAL_MANTISSA_SUFFIX: &str = "decimal_mantissa";

/// What kind of field an instruction describes.
#[derive(Debug, Clone)]
pub enum InstructionKind {
    /// A primitive value.
    Scalar(ValueType),
    /// A decimal whose exponent and mantissa carry their own operators.
    SplitDecimal {
        /// Int32 exponent instruction; carries the decimal's presence.
        exponent: Box<FieldInstruction>,
        /// Mandatory int64 mantissa instruction.
        mantissa: Box<FieldInstruction>,
    },
    /// A nested group of fields.
    Group(Arc<SegmentBody>),
    /// A repeated group preceded by a length field.
    Sequence {
        /// Integer instruction for the number of entries.
        length: Box<FieldInstruction>,
        /// Body of each entry.
        body: Arc<SegmentBody>,
    },
}

/// One field of a template.
#[derive(Debug, Clone)]
pub struct FieldInstruction {
    identity: Arc<FieldIdentity>,
    kind: InstructionKind,
    operator: Operator,
    initial_value: Option<FieldValue>,
    dictionary: DictionaryScope,
    key: Arc<str>,
}

impl FieldInstruction {
    /// Creates a scalar instruction with no operator.
    ///
    /// # Arguments
    /// * `identity` - Name and presence of the field
    /// * `value_type` - Primitive type of the field
    #[must_use]
    pub fn new(identity: FieldIdentity, value_type: ValueType) -> Self {
        Self::with_kind(identity, InstructionKind::Scalar(value_type))
    }

    /// Creates a decimal with individual exponent and mantissa operators.
    ///
    /// The components are named `<name>|decimal_exponent` and
    /// `<name>|decimal_mantissa` and each keeps its own dictionary entry.
    #[must_use]
    pub fn split_decimal(identity: FieldIdentity, exponent: Operator, mantissa: Operator) -> Self {
        let exponent = Self::new(
            identity.derive(DECIMAL_EXPONENT_SUFFIX, identity.is_mandatory()),
            ValueType::Int32,
        )
        .with_operator(exponent);
        let mantissa = Self::new(identity.derive(DECIMAL_MANTISSA_SUFFIX, true), ValueType::Int64)
            .with_operator(mantissa);
        Self::with_kind(
            identity,
            InstructionKind::SplitDecimal {
                exponent: Box::new(exponent),
                mantissa: Box::new(mantissa),
            },
        )
    }

    /// Creates a group instruction.
    #[must_use]
    pub fn group(identity: FieldIdentity, body: Arc<SegmentBody>) -> Self {
        Self::with_kind(identity, InstructionKind::Group(body))
    }

    /// Creates a sequence instruction.
    ///
    /// # Arguments
    /// * `identity` - Name and presence of the sequence
    /// * `length` - Integer instruction decoding the entry count
    /// * `body` - Body of each entry
    #[must_use]
    pub fn sequence(identity: FieldIdentity, length: FieldInstruction, body: Arc<SegmentBody>) -> Self {
        Self::with_kind(
            identity,
            InstructionKind::Sequence {
                length: Box::new(length),
                body,
            },
        )
    }

    fn with_kind(identity: FieldIdentity, kind: InstructionKind) -> Self {
        let key: Arc<str> = Arc::from(identity.name());
        Self {
            identity: Arc::new(identity),
            kind,
            operator: Operator::None,
            initial_value: None,
            dictionary: DictionaryScope::Global,
            key,
        }
    }

    /// Sets the operator.
    #[must_use]
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Sets the initial (constant or default) value.
    ///
    /// For a split decimal the value is divided between the exponent and
    /// mantissa instructions.
    #[must_use]
    pub fn with_initial_value(mut self, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        if let (InstructionKind::SplitDecimal { exponent, mantissa }, FieldValue::Decimal(d)) =
            (&mut self.kind, &value)
        {
            exponent.initial_value = Some(FieldValue::Int32(i32::from(d.exponent())));
            mantissa.initial_value = Some(FieldValue::Int64(d.mantissa()));
        }
        self.initial_value = Some(value);
        self
    }

    /// Sets the dictionary scope; split decimal components follow it.
    #[must_use]
    pub fn with_dictionary(mut self, scope: DictionaryScope) -> Self {
        if let InstructionKind::SplitDecimal { exponent, mantissa } = &mut self.kind {
            exponent.dictionary = scope.clone();
            mantissa.dictionary = scope.clone();
        }
        self.dictionary = scope;
        self
    }

    /// Sets the dictionary key; by default the qualified field name.
    #[must_use]
    pub fn with_key(mut self, key: impl AsRef<str>) -> Self {
        let key = key.as_ref();
        if let InstructionKind::SplitDecimal { exponent, mantissa } = &mut self.kind {
            exponent.key = Arc::from(format!("{key}|{DECIMAL_EXPONENT_SUFFIX}"));
            mantissa.key = Arc::from(format!("{key}|{DECIMAL_MANTISSA_SUFFIX}"));
        }
        self.key = Arc::from(key);
        self
    }

    /// Applies `f` to the exponent instruction of a split decimal.
    #[must_use]
    pub fn map_exponent(mut self, f: impl FnOnce(Self) -> Self) -> Self {
        if let InstructionKind::SplitDecimal { exponent, .. } = &mut self.kind {
            let current = (**exponent).clone();
            **exponent = f(current);
        }
        self
    }

    /// Applies `f` to the mantissa instruction of a split decimal.
    #[must_use]
    pub fn map_mantissa(mut self, f: impl FnOnce(Self) -> Self) -> Self {
        if let InstructionKind::SplitDecimal { mantissa, .. } = &mut self.kind {
            let current = (**mantissa).clone();
            **mantissa = f(current);
        }
        self
    }

    /// Returns the field identity.
    #[must_use]
    pub const fn identity(&self) -> &Arc<FieldIdentity> {
        &self.identity
    }

    /// Returns the qualified field name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Returns the instruction kind.
    #[must_use]
    pub const fn kind(&self) -> &InstructionKind {
        &self.kind
    }

    /// Returns the type of values this instruction produces.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match &self.kind {
            InstructionKind::Scalar(t) => *t,
            InstructionKind::SplitDecimal { .. } => ValueType::Decimal,
            InstructionKind::Group(_) => ValueType::Group,
            InstructionKind::Sequence { .. } => ValueType::Sequence,
        }
    }

    /// Returns the operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the initial value.
    #[must_use]
    pub const fn initial_value(&self) -> Option<&FieldValue> {
        self.initial_value.as_ref()
    }

    /// Returns the dictionary scope.
    #[must_use]
    pub const fn dictionary(&self) -> &DictionaryScope {
        &self.dictionary
    }

    /// Returns the dictionary key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if the field is mandatory.
    #[inline]
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.identity.is_mandatory()
    }

    /// Upper bound on the presence map bits this field may consume.
    ///
    /// Decimals always report two, one per component.
    #[must_use]
    pub fn max_presence_map_bits(&self) -> usize {
        match &self.kind {
            InstructionKind::Scalar(ValueType::Decimal) | InstructionKind::SplitDecimal { .. } => 2,
            InstructionKind::Scalar(_) => usize::from(self.uses_presence_bit()),
            InstructionKind::Group(_) => 1,
            InstructionKind::Sequence { length, .. } => length.max_presence_map_bits(),
        }
    }

    /// Returns true if the field consumes a presence map bit.
    #[must_use]
    pub fn uses_presence_bit(&self) -> bool {
        match &self.kind {
            InstructionKind::Scalar(_) => self.operator.uses_presence_bit(self.is_mandatory()),
            InstructionKind::SplitDecimal { exponent, mantissa } => {
                exponent.uses_presence_bit() || mantissa.uses_presence_bit()
            }
            InstructionKind::Group(_) => !self.is_mandatory(),
            InstructionKind::Sequence { length, .. } => length.uses_presence_bit(),
        }
    }

    /// Checks the instruction for definition errors.
    ///
    /// # Errors
    /// Returns `OperatorNotApplicable`, `MissingConstantValue` or
    /// `InitialValueType`.
    pub fn validate(&self) -> std::result::Result<(), TemplateDefinitionError> {
        let value_type = self.value_type();
        let not_applicable = || TemplateDefinitionError::OperatorNotApplicable {
            name: self.name().to_string(),
            operator: self.operator.as_str(),
            value_type,
        };
        match &self.kind {
            InstructionKind::Scalar(t) => {
                if !self.operator.applies_to(*t) {
                    return Err(not_applicable());
                }
                if self.operator == Operator::Constant && self.initial_value.is_none() {
                    return Err(TemplateDefinitionError::MissingConstantValue {
                        name: self.name().to_string(),
                    });
                }
            }
            InstructionKind::SplitDecimal { exponent, mantissa } => {
                if self.operator != Operator::None {
                    return Err(not_applicable());
                }
                exponent.validate()?;
                mantissa.validate()?;
            }
            InstructionKind::Group(_) | InstructionKind::Sequence { .. } => {
                if self.operator != Operator::None {
                    return Err(not_applicable());
                }
            }
        }
        if let InstructionKind::Sequence { length, .. } = &self.kind {
            length.validate()?;
            if !length.value_type().is_integer() {
                return Err(TemplateDefinitionError::InitialValueType {
                    name: length.name().to_string(),
                    expected: ValueType::UInt32,
                    actual: length.value_type(),
                });
            }
        }
        match &self.initial_value {
            Some(value) if !value.is_type(value_type) => Err(TemplateDefinitionError::InitialValueType {
                name: self.name().to_string(),
                expected: value_type,
                actual: value.value_type(),
            }),
            _ => Ok(()),
        }
    }

    /// Decodes the field and appends it to `fields` when present.
    pub(crate) fn decode<S: DataSource>(
        &self,
        source: &mut S,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
        fields: &mut FieldSet,
    ) -> Result<()> {
        source.begin_field(self.name());
        if let Some(value) = self.decode_value(source, pmap, ctx)? {
            fields.add_field(Arc::clone(&self.identity), value);
        }
        Ok(())
    }

    /// Decodes the field's value. `None` means absent.
    pub(crate) fn decode_value<S: DataSource>(
        &self,
        source: &mut S,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
    ) -> Result<Option<FieldValue>> {
        match &self.kind {
            InstructionKind::Scalar(t) => self.decode_scalar(*t, source, pmap, ctx),
            InstructionKind::SplitDecimal { exponent, mantissa } => {
                let Some(e) = exponent.decode_value(source, pmap, ctx)? else {
                    return Ok(None);
                };
                let m = mantissa
                    .decode_value(source, pmap, ctx)?
                    .ok_or_else(|| missing(mantissa.name()))?;
                let (Some(e), Some(m)) = (e.as_i128(), m.as_i128()) else {
                    return Err(self.mismatch(&e).into());
                };
                Ok(Some(self.scalar(ValueType::Decimal, ctx).decimal(e, m)?))
            }
            InstructionKind::Group(body) => {
                if !self.is_mandatory() && !pmap.check_next_field() {
                    return Ok(None);
                }
                Ok(Some(FieldValue::group(body.decode_group(source, ctx)?)))
            }
            InstructionKind::Sequence { length, body } => {
                source.begin_field(length.name());
                let Some(count) = length.decode_value(source, pmap, ctx)? else {
                    return Ok(None);
                };
                let count = count
                    .as_i128()
                    .and_then(|c| usize::try_from(c).ok())
                    .ok_or_else(|| self.mismatch(&count))?;
                if count > ctx.config().max_sequence_length {
                    return Err(overflow_length(self.name(), count).into());
                }
                let mut sequence = Sequence::with_capacity(Arc::clone(length.identity()), count.min(64));
                for _ in 0..count {
                    sequence.push(body.decode_group(source, ctx)?);
                }
                Ok(Some(FieldValue::sequence(sequence)))
            }
        }
    }

    fn decode_scalar<S: DataSource>(
        &self,
        value_type: ValueType,
        source: &mut S,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
    ) -> Result<Option<FieldValue>> {
        let scalar = self.scalar(value_type, ctx);
        let mandatory = self.is_mandatory();
        match self.operator {
            Operator::None => Ok(scalar.read(source)?),
            Operator::Constant => {
                if mandatory || pmap.check_next_field() {
                    Ok(self.initial_value.clone())
                } else {
                    Ok(None)
                }
            }
            Operator::Default => {
                if pmap.check_next_field() {
                    return Ok(scalar.read(source)?);
                }
                match &self.initial_value {
                    Some(value) => Ok(Some(value.clone())),
                    None if mandatory => Err(missing(self.name()).into()),
                    None => Ok(None),
                }
            }
            Operator::Copy | Operator::Increment | Operator::Tail => {
                if !pmap.check_next_field() {
                    return self.decode_from_previous(value_type, ctx);
                }
                let value = if self.operator == Operator::Tail {
                    let base = self.tail_base(value_type, ctx)?;
                    scalar.read_tail(source, &base)?
                } else {
                    scalar.read(source)?
                };
                self.store(ctx, value_type, value.as_ref());
                Ok(value)
            }
            Operator::Delta => {
                let base = self.delta_base(value_type, ctx)?;
                let value = scalar.read_delta(source, &base)?;
                if value.is_some() {
                    self.store(ctx, value_type, value.as_ref());
                }
                Ok(value)
            }
        }
    }

    /// Value of a copy, increment or tail field whose presence bit is clear.
    fn decode_from_previous(&self, value_type: ValueType, ctx: &mut Context) -> Result<Option<FieldValue>> {
        match self.previous(value_type, ctx)? {
            Some(DictionaryValue::Assigned(previous)) => {
                if self.operator != Operator::Increment {
                    return Ok(Some(previous));
                }
                let value = increment(&previous).ok_or_else(|| self.mismatch(&previous))?;
                self.store(ctx, value_type, Some(&value));
                Ok(Some(value))
            }
            Some(DictionaryValue::Empty(_)) if self.is_mandatory() => {
                Err(TemplateDefinitionError::MandatoryFieldEmpty {
                    name: self.name().to_string(),
                }
                .into())
            }
            Some(DictionaryValue::Empty(_)) => Ok(None),
            None => {
                let value = self.initial_value.clone();
                if value.is_none() && self.is_mandatory() {
                    return Err(missing(self.name()).into());
                }
                self.store(ctx, value_type, value.as_ref());
                Ok(value)
            }
        }
    }

    /// Encodes the field's value taken from `fields`.
    pub(crate) fn encode<D: DataDestination>(
        &self,
        dest: &mut D,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
        fields: &FieldSet,
    ) -> Result<()> {
        self.encode_value(dest, pmap, ctx, fields.get_field(self.name()))
    }

    /// Encodes one value; `None` means absent.
    pub(crate) fn encode_value<D: DataDestination>(
        &self,
        dest: &mut D,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
        value: Option<&FieldValue>,
    ) -> Result<()> {
        match &self.kind {
            InstructionKind::Scalar(t) => {
                let value = value.map(|v| self.scalar(*t, ctx).coerce(v)).transpose()?;
                self.encode_scalar(*t, dest, pmap, ctx, value.as_ref())
            }
            InstructionKind::SplitDecimal { exponent, mantissa } => {
                let scalar = self.scalar(ValueType::Decimal, ctx);
                let decimal = match value.map(|v| scalar.coerce(v)).transpose()? {
                    Some(FieldValue::Decimal(d)) => d,
                    Some(other) => return Err(self.mismatch(&other).into()),
                    None if self.is_mandatory() => return Err(missing(self.name()).into()),
                    None => return exponent.encode_value(dest, pmap, ctx, None),
                };
                scalar.check_wire_decimal(decimal)?;
                let e = FieldValue::Int32(i32::from(decimal.exponent()));
                let m = FieldValue::Int64(decimal.mantissa());
                exponent.encode_value(dest, pmap, ctx, Some(&e))?;
                mantissa.encode_value(dest, pmap, ctx, Some(&m))
            }
            InstructionKind::Group(body) => {
                let group = match value {
                    Some(FieldValue::Group(group)) => group,
                    Some(other) => return Err(self.mismatch(other).into()),
                    None if self.is_mandatory() => return Err(missing(self.name()).into()),
                    None => {
                        pmap.set_next_field(false);
                        return Ok(());
                    }
                };
                if !self.is_mandatory() {
                    pmap.set_next_field(true);
                }
                body.encode_group(dest, ctx, group)
            }
            InstructionKind::Sequence { length, body } => {
                let sequence = match value {
                    Some(FieldValue::Sequence(sequence)) => Some(sequence),
                    Some(other) => return Err(self.mismatch(other).into()),
                    None => None,
                };
                let Some(sequence) = sequence else {
                    return length.encode_value(dest, pmap, ctx, None);
                };
                let count = i128::try_from(sequence.len())
                    .ok()
                    .and_then(|n| int_value(length.value_type(), n).ok())
                    .ok_or_else(|| overflow_length(self.name(), sequence.len()))?;
                length.encode_value(dest, pmap, ctx, Some(&count))?;
                for entry in sequence.iter() {
                    body.encode_group(dest, ctx, entry)?;
                }
                Ok(())
            }
        }
    }

    fn encode_scalar<D: DataDestination>(
        &self,
        value_type: ValueType,
        dest: &mut D,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
        value: Option<&FieldValue>,
    ) -> Result<()> {
        let scalar = self.scalar(value_type, ctx);
        let mandatory = self.is_mandatory();
        if value.is_none() && mandatory {
            return Err(missing(self.name()).into());
        }
        match self.operator {
            Operator::None => scalar.write(dest, value)?,
            Operator::Constant => {
                if value.is_some_and(|v| Some(v) != self.initial_value.as_ref()) {
                    return Err(EncodingError::ConstantMismatch {
                        name: self.name().to_string(),
                    }
                    .into());
                }
                if !mandatory {
                    pmap.set_next_field(value.is_some());
                }
            }
            Operator::Default => {
                if value == self.initial_value.as_ref() {
                    pmap.set_next_field(false);
                } else {
                    pmap.set_next_field(true);
                    scalar.write(dest, value)?;
                }
            }
            Operator::Copy | Operator::Increment | Operator::Tail => {
                let previous = self.previous(value_type, ctx)?;
                if self.reproduces(previous.as_ref(), value) {
                    pmap.set_next_field(false);
                } else {
                    pmap.set_next_field(true);
                    if self.operator == Operator::Tail {
                        let base = self.base_from(previous.as_ref(), value_type);
                        scalar.write_tail(dest, value, &base)?;
                    } else {
                        scalar.write(dest, value)?;
                    }
                }
                self.store(ctx, value_type, value);
            }
            Operator::Delta => {
                let base = self.delta_base(value_type, ctx)?;
                scalar.write_delta(dest, value, &base)?;
                if value.is_some() {
                    self.store(ctx, value_type, value);
                }
            }
        }
        Ok(())
    }

    /// Returns true if a decoder seeing a clear presence bit would produce
    /// `value` from the dictionary state `previous`.
    fn reproduces(&self, previous: Option<&DictionaryValue>, value: Option<&FieldValue>) -> bool {
        match previous {
            Some(DictionaryValue::Assigned(p)) if self.operator == Operator::Increment => {
                value.is_some() && increment(p).as_ref() == value
            }
            Some(DictionaryValue::Assigned(p)) => value == Some(p),
            Some(DictionaryValue::Empty(_)) => value.is_none() && !self.is_mandatory(),
            None => value == self.initial_value.as_ref(),
        }
    }

    /// Reads this instruction's dictionary entry, checking its type.
    fn previous(&self, value_type: ValueType, ctx: &mut Context) -> Result<Option<DictionaryValue>> {
        let Some(entry) = ctx.dictionary(&self.dictionary).find(&self.key) else {
            return Ok(None);
        };
        if entry.value_type() != value_type {
            return Err(TemplateDefinitionError::DictionaryTypeMismatch {
                key: self.key.to_string(),
                expected: value_type,
                found: entry.value_type(),
            }
            .into());
        }
        Ok(Some(entry.clone()))
    }

    fn store(&self, ctx: &mut Context, value_type: ValueType, value: Option<&FieldValue>) {
        let entry = value.map_or(DictionaryValue::Empty(value_type), |v| {
            DictionaryValue::Assigned(v.clone())
        });
        ctx.dictionary(&self.dictionary).add(&self.key, entry);
    }

    /// Base for delta: previous value, else initial value, else zero.
    fn delta_base(&self, value_type: ValueType, ctx: &mut Context) -> Result<FieldValue> {
        match self.previous(value_type, ctx)? {
            Some(DictionaryValue::Empty(_)) => Err(TemplateDefinitionError::MandatoryFieldEmpty {
                name: self.name().to_string(),
            }
            .into()),
            previous => Ok(self.base_from(previous.as_ref(), value_type)),
        }
    }

    /// Base for tail: previous value, else initial value, else empty.
    fn tail_base(&self, value_type: ValueType, ctx: &mut Context) -> Result<FieldValue> {
        let previous = self.previous(value_type, ctx)?;
        Ok(self.base_from(previous.as_ref(), value_type))
    }

    fn base_from(&self, previous: Option<&DictionaryValue>, value_type: ValueType) -> FieldValue {
        match previous {
            Some(DictionaryValue::Assigned(value)) => value.clone(),
            _ => self
                .initial_value
                .clone()
                .unwrap_or_else(|| zero_value(value_type)),
        }
    }

    fn scalar<'a>(&'a self, value_type: ValueType, ctx: &Context) -> Scalar<'a> {
        Scalar {
            name: self.name(),
            value_type,
            nullable: !self.is_mandatory(),
            strict: ctx.is_strict(),
            max_length: ctx.config().max_byte_vector_length,
        }
    }

    fn mismatch(&self, value: &FieldValue) -> EncodingError {
        EncodingError::TypeMismatch {
            name: self.name().to_string(),
            expected: self.value_type(),
            actual: value.value_type(),
        }
    }
}

fn missing(name: &str) -> EncodingError {
    EncodingError::MissingMandatoryField {
        name: name.to_string(),
    }
}

fn overflow_length(name: &str, length: usize) -> EncodingError {
    EncodingError::LengthTooLarge {
        name: name.to_string(),
        length,
    }
}
