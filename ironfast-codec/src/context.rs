/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Codec configuration and per-stream state.

use crate::dictionary::{Dictionary, DictionarySet};
use crate::operators::DictionaryScope;
use crate::pmap::PresenceMap;
use ironfast_core::error::EncodingError;
use tracing::warn;

/// Configuration shared by decoders and encoders.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Reject nonconforming input instead of tolerating it.
    pub strict: bool,
    /// Initial capacity of the encoder's working buffers, in bytes.
    pub initial_buffer_capacity: usize,
    /// Largest sequence length the decoder accepts.
    pub max_sequence_length: usize,
    /// Largest byte vector or unicode string length the decoder accepts.
    pub max_byte_vector_length: usize,
}

impl CodecConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets strict mode.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the initial working buffer capacity.
    #[must_use]
    pub const fn with_initial_buffer_capacity(mut self, capacity: usize) -> Self {
        self.initial_buffer_capacity = capacity;
        self
    }

    /// Sets the largest accepted sequence length.
    #[must_use]
    pub const fn with_max_sequence_length(mut self, length: usize) -> Self {
        self.max_sequence_length = length;
        self
    }

    /// Sets the largest accepted byte vector length.
    #[must_use]
    pub const fn with_max_byte_vector_length(mut self, length: usize) -> Self {
        self.max_byte_vector_length = length;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict: true,
            initial_buffer_capacity: 256,
            max_sequence_length: 65_536,
            max_byte_vector_length: 1 << 20,
        }
    }
}

/// State carried from one message to the next on a single stream.
///
/// Owns the dictionaries, the id of the last template processed and, on the
/// encode side, a pool of working buffers.
#[derive(Debug, Default)]
pub struct Context {
    config: CodecConfig,
    dictionaries: DictionarySet,
    template_id: Option<u32>,
    buffers: Vec<Vec<u8>>,
}

impl Context {
    /// Creates a context with empty dictionaries.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Returns true in strict mode.
    #[inline]
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.config.strict
    }

    /// Returns the id of the template currently or last processed.
    #[must_use]
    pub const fn template_id(&self) -> Option<u32> {
        self.template_id
    }

    pub(crate) fn set_template_id(&mut self, template_id: Option<u32>) {
        self.template_id = template_id;
    }

    /// Returns the dictionaries.
    #[must_use]
    pub const fn dictionaries(&self) -> &DictionarySet {
        &self.dictionaries
    }

    /// Resolves a dictionary scope against the current template.
    pub(crate) fn dictionary(&mut self, scope: &DictionaryScope) -> &mut Dictionary {
        self.dictionaries
            .resolve(scope, self.template_id.unwrap_or_default())
    }

    pub(crate) fn reset_template(&mut self, template_id: u32) {
        self.dictionaries.reset_template(template_id);
    }

    /// Clears one named dictionary.
    pub fn reset_named(&mut self, name: &str) {
        self.dictionaries.reset_named(name);
    }

    /// Clears every dictionary and forgets the last template id.
    pub fn reset(&mut self) {
        self.dictionaries.reset();
        self.template_id = None;
    }

    /// Validates a decoded presence map against its segment.
    ///
    /// # Errors
    /// Returns `PresenceMapOverlong` in strict mode when bits beyond the
    /// segment's capacity are set.
    pub(crate) fn check_presence_map(&self, pmap: &PresenceMap) -> Result<(), EncodingError> {
        let bits = pmap.significant_bits();
        if bits <= pmap.capacity() {
            return Ok(());
        }
        if self.config.strict {
            return Err(EncodingError::PresenceMapOverlong {
                bits,
                capacity: pmap.capacity(),
            });
        }
        warn!(bits, capacity = pmap.capacity(), "overlong presence map");
        Ok(())
    }

    pub(crate) fn take_buffer(&mut self) -> Vec<u8> {
        self.buffers
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.config.initial_buffer_capacity))
    }

    pub(crate) fn return_buffer(&mut self, mut buffer: Vec<u8>) {
        buffer.clear();
        self.buffers.push(buffer);
    }
}
