/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST protocol decoder.
//!
//! Turns a byte stream into [`Message`]s. A decoder owns the dictionaries of
//! one stream; decode every message of the stream with the same instance.

use std::sync::Arc;

use ironfast_core::error::{EncodingError, Result};
use ironfast_core::field_set::{FieldSet, Message};
use tracing::debug;

use crate::context::{CodecConfig, Context};
use crate::pmap::PresenceMap;
use crate::primitives::decode_unsigned;
use crate::registry::TemplateRegistry;
use crate::source::DataSource;

/// FAST protocol decoder.
#[derive(Debug)]
pub struct Decoder {
    registry: Arc<TemplateRegistry>,
    context: Context,
}

impl Decoder {
    /// Creates a decoder with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    /// Creates a decoder with the given configuration.
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

    /// Resets the decoder state.
    pub fn reset(&mut self) {
        debug!("resetting decoder");
        self.context.reset();
    }

    /// Clears one named dictionary, leaving every other scope intact.
    pub fn reset_dictionary(&mut self, name: &str) {
        self.context.reset_named(name);
    }

    /// Decodes the next message.
    ///
    /// # Returns
    /// `Ok(None)` when the source ends cleanly before a new message.
    ///
    /// # Errors
    /// Any malformed data, unknown template or dictionary conflict aborts the
    /// message. Dictionary updates made before the failure are kept.
    pub fn decode_message<S: DataSource>(&mut self, source: &mut S) -> Result<Option<Message>> {
        source.begin_message();
        self.decode_segment(source)
    }

    /// Decodes messages until the source is exhausted.
    ///
    /// # Errors
    /// Stops at the first failing message.
    pub fn decode_all<S: DataSource>(&mut self, source: &mut S) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while let Some(message) = self.decode_message(source)? {
            messages.push(message);
        }
        Ok(messages)
    }

    fn decode_segment<S: DataSource>(&mut self, source: &mut S) -> Result<Option<Message>> {
        let mut pmap = PresenceMap::new(self.registry.presence_map_bits());
        if !pmap.decode(source) {
            if pmap.is_empty() {
                return Ok(None);
            }
            return Err(EncodingError::UnexpectedEof {
                context: "message presence map",
            }
            .into());
        }
        self.context.check_presence_map(&pmap)?;

        let template_id = if pmap.check_next_field() {
            let id = decode_unsigned(source, false)?.unwrap_or_default();
            u32::try_from(id).map_err(|_| EncodingError::IntegerOverflow {
                type_name: "template id",
            })?
        } else {
            self.context
                .template_id()
                .ok_or(EncodingError::MissingTemplateId)?
        };

        let template = self
            .registry
            .get(template_id)
            .cloned()
            .ok_or(EncodingError::UnknownTemplate(template_id))?;
        self.context.set_template_id(Some(template_id));
        if template.reset() {
            self.context.reset_template(template_id);
        }
        debug!(template_id, template = template.name(), "decoding message");

        let body = template.body();
        let mut fields = FieldSet::with_capacity(body.len());
        body.decode_fields(source, &mut pmap, &mut self.context, &mut fields)?;
        Ok(Some(Message::new(template_id, fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::FieldInstruction;
    use crate::operators::{DictionaryScope, Operator};
    use crate::segment::{SegmentBody, Template};
    use crate::source::SliceSource;
    use ironfast_core::error::FastError;
    use ironfast_core::identity::FieldIdentity;
    use ironfast_core::value::{FieldValue, ValueType};

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

    #[test]
    fn test_decode_empty_source() {
        let mut decoder = Decoder::new(registry());
        let mut source = SliceSource::new(&[]);
        assert_eq!(decoder.decode_message(&mut source).unwrap(), None);
    }

    #[test]
    fn test_decode_truncated_presence_map() {
        let mut decoder = Decoder::new(registry());
        let mut source = SliceSource::new(&[0x40]);
        assert!(matches!(
            decoder.decode_message(&mut source),
            Err(FastError::Encoding(EncodingError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_decode_reuses_template_id() {
        // pmap 11, id 7, seq 1; then pmap 00 (same template, increment)
        let data = [0xE0, 0x87, 0x81, 0x80];
        let mut decoder = Decoder::new(registry());
        let mut source = SliceSource::new(&data);
        let messages = decoder.decode_all(&mut source).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].template_id(), 7);
        assert_eq!(messages[0].get_field("Seq"), Some(&FieldValue::UInt32(1)));
        assert_eq!(messages[1].get_field("Seq"), Some(&FieldValue::UInt32(2)));
    }

    #[test]
    fn test_decode_missing_template_id() {
        let mut decoder = Decoder::new(registry());
        let mut source = SliceSource::new(&[0x80]);
        assert!(matches!(
            decoder.decode_message(&mut source),
            Err(FastError::Encoding(EncodingError::MissingTemplateId))
        ));
    }

    #[test]
    fn test_unknown_template_leaves_state_untouched() {
        let mut decoder = Decoder::new(registry());
        let mut source = SliceSource::new(&[0xE0, 0x87, 0x81, 0xC0, 0x89]);
        decoder.decode_message(&mut source).unwrap();
        let before = decoder.context().dictionaries().global().len();

        let err = decoder.decode_message(&mut source).unwrap_err();
        assert_eq!(err, FastError::Encoding(EncodingError::UnknownTemplate(9)));
        assert!(err.to_string().contains("[ERR D9]"));
        assert_eq!(decoder.context().template_id(), Some(7));
        assert_eq!(decoder.context().dictionaries().global().len(), before);
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
        let mut decoder = Decoder::new(registry);
        // pmap 11, id 3, qty 5; then pmap 00 (copy)
        let messages = decoder
            .decode_all(&mut SliceSource::new(&[0xE0, 0x83, 0x85, 0x80]))
            .unwrap();
        assert_eq!(messages[1].get_field("Qty"), Some(&FieldValue::UInt32(5)));

        decoder.reset_dictionary("other");
        let message = decoder.decode_message(&mut SliceSource::new(&[0x80])).unwrap();
        assert_eq!(
            message.and_then(|m| m.get_field("Qty").cloned()),
            Some(FieldValue::UInt32(5))
        );

        decoder.reset_dictionary("md");
        assert_eq!(decoder.context().template_id(), Some(3));
        assert!(matches!(
            decoder.decode_message(&mut SliceSource::new(&[0x80])),
            Err(FastError::Encoding(EncodingError::MissingMandatoryField { .. }))
        ));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut decoder = Decoder::new(registry());
        let mut source = SliceSource::new(&[0xE0, 0x87, 0x81]);
        decoder.decode_message(&mut source).unwrap();
        decoder.reset();
        assert_eq!(decoder.context().template_id(), None);
        assert!(decoder.context().dictionaries().global().is_empty());
    }
}
