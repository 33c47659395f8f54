/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Segment bodies and templates.
//!
//! A segment is an ordered list of instructions governed by one presence map.
//! Templates, groups and sequence entries all own a [`SegmentBody`].

use std::sync::Arc;

use ironfast_core::error::{EncodingError, Result, TemplateDefinitionError};
use ironfast_core::field_set::FieldSet;
use tracing::warn;

use crate::context::Context;
use crate::destination::DataDestination;
use crate::instruction::FieldInstruction;
use crate::pmap::PresenceMap;
use crate::source::DataSource;

/// Ordered instructions sharing one presence map.
#[derive(Debug)]
pub struct SegmentBody {
    instructions: Vec<FieldInstruction>,
    presence_map_bits: usize,
    uses_presence_map: bool,
}

impl SegmentBody {
    /// Builds a segment, validating every instruction.
    ///
    /// # Errors
    /// Returns the first definition error found in `instructions`.
    pub fn new(instructions: Vec<FieldInstruction>) -> std::result::Result<Self, TemplateDefinitionError> {
        for instruction in &instructions {
            instruction.validate()?;
        }
        let presence_map_bits = instructions
            .iter()
            .map(FieldInstruction::max_presence_map_bits)
            .sum();
        let uses_presence_map = instructions.iter().any(FieldInstruction::uses_presence_bit);
        Ok(Self {
            instructions,
            presence_map_bits,
            uses_presence_map,
        })
    }

    /// Returns the instructions in order.
    #[must_use]
    pub fn instructions(&self) -> &[FieldInstruction] {
        &self.instructions
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the segment has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Upper bound on the presence map bits of this segment. Nested groups
    /// and sequence entries carry their own maps and are not included.
    #[must_use]
    pub const fn presence_map_bits(&self) -> usize {
        self.presence_map_bits
    }

    /// Returns true if any instruction consumes a presence map bit; nested
    /// segments without one carry no presence map on the wire.
    #[must_use]
    pub const fn uses_presence_map(&self) -> bool {
        self.uses_presence_map
    }

    /// Finds an instruction by qualified field name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FieldInstruction> {
        self.instructions.iter().find(|i| i.name() == name)
    }

    /// Decodes every instruction in order into `fields`.
    pub(crate) fn decode_fields<S: DataSource>(
        &self,
        source: &mut S,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
        fields: &mut FieldSet,
    ) -> Result<()> {
        for instruction in &self.instructions {
            instruction.decode(source, pmap, ctx, fields)?;
        }
        Ok(())
    }

    /// Decodes a nested segment preceded by its own presence map.
    pub(crate) fn decode_group<S: DataSource>(&self, source: &mut S, ctx: &mut Context) -> Result<FieldSet> {
        let mut pmap = PresenceMap::new(self.presence_map_bits);
        if self.uses_presence_map {
            if !pmap.decode(source) {
                return Err(EncodingError::UnexpectedEof {
                    context: "group presence map",
                }
                .into());
            }
            ctx.check_presence_map(&pmap)?;
        }
        let mut fields = FieldSet::with_capacity(self.instructions.len());
        self.decode_fields(source, &mut pmap, ctx, &mut fields)?;
        Ok(fields)
    }

    /// Encodes every instruction in order, taking values from `fields`.
    ///
    /// # Errors
    /// In strict mode an entry of `fields` that no instruction names is an
    /// `UnknownField` error.
    pub(crate) fn encode_fields<D: DataDestination>(
        &self,
        dest: &mut D,
        pmap: &mut PresenceMap,
        ctx: &mut Context,
        fields: &FieldSet,
    ) -> Result<()> {
        for entry in fields {
            if self.find(entry.name()).is_none() {
                if ctx.is_strict() {
                    return Err(EncodingError::UnknownField {
                        name: entry.name().to_string(),
                    }
                    .into());
                }
                warn!(field = entry.name(), "ignoring field unknown to the template");
            }
        }
        for instruction in &self.instructions {
            instruction.encode(dest, pmap, ctx, fields)?;
        }
        Ok(())
    }

    /// Encodes a nested segment: its presence map, then the field bytes.
    pub(crate) fn encode_group<D: DataDestination>(
        &self,
        dest: &mut D,
        ctx: &mut Context,
        fields: &FieldSet,
    ) -> Result<()> {
        let mut buffer = ctx.take_buffer();
        let mut pmap = PresenceMap::new(self.presence_map_bits);
        let result = self.encode_fields(&mut buffer, &mut pmap, ctx, fields);
        if result.is_ok() {
            if self.uses_presence_map {
                pmap.encode(dest);
            }
            dest.put_slice(&buffer);
        }
        ctx.return_buffer(buffer);
        result
    }
}

/// A numbered message layout.
#[derive(Debug)]
pub struct Template {
    id: u32,
    name: String,
    namespace: String,
    reset: bool,
    body: Arc<SegmentBody>,
}

impl Template {
    /// Creates a template.
    ///
    /// # Arguments
    /// * `id` - Template id sent on the wire
    /// * `name` - Template name
    /// * `body` - The template's instructions
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, body: SegmentBody) -> Self {
        Self {
            id,
            name: name.into(),
            namespace: String::new(),
            reset: false,
            body: Arc::new(body),
        }
    }

    /// Sets the template namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets whether the template's dictionary is cleared before each message.
    #[must_use]
    pub const fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Returns the template id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the template namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns true if the template resets its dictionary on every message.
    #[must_use]
    pub const fn reset(&self) -> bool {
        self.reset
    }

    /// Returns the template body.
    #[must_use]
    pub const fn body(&self) -> &Arc<SegmentBody> {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecConfig;
    use crate::operators::Operator;
    use crate::source::SliceSource;
    use ironfast_core::error::FastError;
    use ironfast_core::identity::FieldIdentity;
    use ironfast_core::value::{FieldValue, ValueType};

    fn body() -> SegmentBody {
        SegmentBody::new(vec![
            FieldInstruction::new(FieldIdentity::local("Px"), ValueType::Int32),
            FieldInstruction::new(FieldIdentity::local("Qty"), ValueType::UInt32)
                .with_operator(Operator::Copy),
            FieldInstruction::new(FieldIdentity::local("Type"), ValueType::Ascii)
                .with_operator(Operator::Constant)
                .with_initial_value(FieldValue::ascii("0")),
        ])
        .unwrap()
    }

    #[test]
    fn test_segment_bit_accounting() {
        let body = body();
        assert_eq!(body.len(), 3);
        assert_eq!(body.presence_map_bits(), 1);
        assert!(body.uses_presence_map());
        assert!(body.find("Qty").is_some());
        assert!(body.find("Missing").is_none());

        let plain = SegmentBody::new(vec![FieldInstruction::new(
            FieldIdentity::local("Px"),
            ValueType::Int32,
        )])
        .unwrap();
        assert!(!plain.uses_presence_map());
    }

    #[test]
    fn test_segment_rejects_invalid_instruction() {
        let result = SegmentBody::new(vec![
            FieldInstruction::new(FieldIdentity::local("Px"), ValueType::Int32)
                .with_operator(Operator::Tail),
        ]);
        assert!(matches!(
            result,
            Err(TemplateDefinitionError::OperatorNotApplicable { .. })
        ));
    }

    #[test]
    fn test_group_round_trip() {
        let body = body();
        let fields = FieldSet::new()
            .with_field(Arc::new(FieldIdentity::local("Px")), -3i32)
            .with_field(Arc::new(FieldIdentity::local("Qty")), 7u32)
            .with_field(Arc::new(FieldIdentity::local("Type")), FieldValue::ascii("0"));

        let mut encoder = Context::new(CodecConfig::default());
        let mut out = Vec::new();
        body.encode_group(&mut out, &mut encoder, &fields).unwrap();
        assert_eq!(out, vec![0xC0, 0xFD, 0x87]);

        let mut decoder = Context::new(CodecConfig::default());
        let mut source = SliceSource::new(&out);
        let decoded = body.decode_group(&mut source, &mut decoder).unwrap();
        assert_eq!(decoded, fields);
    }

    #[test]
    fn test_group_eof_at_presence_map() {
        let mut ctx = Context::new(CodecConfig::default());
        let mut source = SliceSource::new(&[]);
        assert!(matches!(
            body().decode_group(&mut source, &mut ctx),
            Err(FastError::Encoding(EncodingError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_unknown_field_strict_and_lenient() {
        let body = body();
        let fields = FieldSet::new()
            .with_field(Arc::new(FieldIdentity::local("Px")), 1i32)
            .with_field(Arc::new(FieldIdentity::local("Qty")), 1u32)
            .with_field(Arc::new(FieldIdentity::local("Type")), FieldValue::ascii("0"))
            .with_field(Arc::new(FieldIdentity::local("Extra")), 1u32);

        let mut strict = Context::new(CodecConfig::default());
        let mut out = Vec::new();
        assert!(matches!(
            body.encode_group(&mut out, &mut strict, &fields),
            Err(FastError::Encoding(EncodingError::UnknownField { .. }))
        ));
        assert!(out.is_empty());

        let mut lenient = Context::new(CodecConfig::default().with_strict(false));
        assert!(body.encode_group(&mut out, &mut lenient, &fields).is_ok());
    }
}
