/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST protocol encoder.
//!
//! The mirror of [`crate::decoder::Decoder`]. Field bytes are collected in a
//! working buffer until the segment's presence map is complete; the map is
//! then written ahead of them.

use std::sync::Arc;

use ironfast_core::error::{EncodingError, Result};
use ironfast_core::field_set::{FieldSet, Message};
use tracing::debug;

use crate::context::{CodecConfig, Context};
use crate::destination::DataDestination;
use crate::pmap::PresenceMap;
use crate::primitives::encode_unsigned;
use crate::registry::TemplateRegistry;

/// FAST protocol encoder.
#[derive(Debug)]
pub struct Encoder {
    registry: Arc<TemplateRegistry>,
    context: Context,
}

impl Encoder {
    /// Creates an encoder with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    /// Creates an encoder with the given configuration.
    #[must_use]
    pub fn with_config(registry: Arc<TemplateRegistry>, config: CodecConfig) -> Self {
        Self {
            registry,
            context: Context::new(config),
        }
    }

    /// Returns the template registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    /// Returns the stream state.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Resets the encoder state.
    pub fn reset(&mut self) {
        debug!("resetting encoder");
        self.context.reset();
    }

    /// Clears one named dictionary, leaving every other scope intact.
    pub fn reset_dictionary(&mut self, name: &str) {
        self.context.reset_named(name);
    }

    /// Encodes one message.
    ///
    /// # Arguments
    /// * `dest` - Where the encoded bytes are appended
    /// * `template_id` - Template describing `fields`
    /// * `fields` - The application data
    ///
    /// # Errors
    /// Nothing is written to `dest` when encoding fails. Dictionary updates
    /// made before the failure are kept.
    pub fn encode_message<D: DataDestination>(
        &mut self,
        dest: &mut D,
        template_id: u32,
        fields: &FieldSet,
    ) -> Result<()> {
        let template = self
            .registry
            .get(template_id)
            .cloned()
            .ok_or(EncodingError::UnknownTemplate(template_id))?;

        let previous = self.context.template_id();
        self.context.set_template_id(Some(template_id));
        if template.reset() {
            self.context.reset_template(template_id);
        }
        debug!(template_id, template = template.name(), "encoding message");

        let mut buffer = self.context.take_buffer();
        let mut pmap = PresenceMap::new(self.registry.presence_map_bits());
        let send_id = previous != Some(template_id);
        pmap.set_next_field(send_id);
        if send_id {
            encode_unsigned(&mut buffer, u64::from(template_id));
        }

        let result = template
            .body()
            .encode_fields(&mut buffer, &mut pmap, &mut self.context, fields);
        match &result {
            Ok(()) => {
                pmap.encode(dest);
                dest.put_slice(&buffer);
            }
            Err(_) => self.context.set_template_id(previous),
        }
        self.context.return_buffer(buffer);
        result
    }

    /// Encodes a [`Message`].
    ///
    /// # Errors
    /// See [`Encoder::encode_message`].
    pub fn encode<D: DataDestination>(&mut self, dest: &mut D, message: &Message) -> Result<()> {
        self.encode_message(dest, message.template_id(), message.fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::FieldInstruction;
    use crate::operators::{DictionaryScope, Operator};
    use crate::segment::{SegmentBody, Template};
    use ironfast_core::error::FastError;
    use ironfast_core::identity::FieldIdentity;
    use ironfast_core::value::ValueType;

    fn registry() -> Arc<TemplateRegistry> {
        let body = SegmentBody::new(vec![
            FieldInstruction::new(FieldIdentity::local("Seq"), ValueType::UInt32)
                .with_operator(Operator::Increment),
        ])
        .unwrap();
        Arc::new(
            TemplateRegistry::new()
                .with_template(Template::new(7, "Heartbeat", body))
                .unwrap(),
        )
    }

    fn seq(n: u32) -> FieldSet {
        FieldSet::new().with_field(Arc::new(FieldIdentity::local("Seq")), n)
    }

    #[test]
    fn test_template_id_sent_only_on_change() {
        let mut encoder = Encoder::new(registry());
        let mut out = Vec::new();
        encoder.encode_message(&mut out, 7, &seq(1)).unwrap();
        encoder.encode_message(&mut out, 7, &seq(2)).unwrap();
        assert_eq!(out, vec![0xE0, 0x87, 0x81, 0x80]);
    }

    #[test]
    fn test_unknown_template() {
        let mut encoder = Encoder::new(registry());
        let mut out = Vec::new();
        assert_eq!(
            encoder.encode_message(&mut out, 3, &seq(1)),
            Err(FastError::Encoding(EncodingError::UnknownTemplate(3)))
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_reset_named_dictionary() {
        let body = SegmentBody::new(vec![
            FieldInstruction::new(FieldIdentity::local("Qty"), ValueType::UInt32)
                .with_operator(Operator::Copy)
                .with_dictionary(DictionaryScope::Named("md".into())),
        ])
        .unwrap();
        let registry = Arc::new(
            TemplateRegistry::new()
                .with_template(Template::new(3, "Quote", body))
                .unwrap(),
        );
        let qty = FieldSet::new().with_field(Arc::new(FieldIdentity::local("Qty")), 5u32);
        let mut encoder = Encoder::new(registry);
        let mut out = Vec::new();

        encoder.encode_message(&mut out, 3, &qty).unwrap();
        encoder.encode_message(&mut out, 3, &qty).unwrap();
        encoder.reset_dictionary("md");
        encoder.encode_message(&mut out, 3, &qty).unwrap();
        assert_eq!(out, vec![0xE0, 0x83, 0x85, 0x80, 0xA0, 0x85]);
    }

    #[test]
    fn test_failed_message_writes_nothing() {
        let mut encoder = Encoder::new(registry());
        let mut out = Vec::new();
        let result = encoder.encode_message(&mut out, 7, &FieldSet::new());
        assert!(matches!(
            result,
            Err(FastError::Encoding(EncodingError::MissingMandatoryField { .. }))
        ));
        assert!(out.is_empty());
        assert_eq!(encoder.context().template_id(), None);

        encoder.encode_message(&mut out, 7, &seq(4)).unwrap();
        assert_eq!(out, vec![0xE0, 0x87, 0x84]);
    }
}
