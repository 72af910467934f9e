//! Message-typed access to slice payloads.

use std::sync::Arc;

use skein_message::{Message, MessageDefinition, MessageError};

use crate::slice::Slice;

impl Slice {
    /// Decode the payload as a message of `definition`.
    pub fn decode_message(
        &self,
        definition: Arc<MessageDefinition>,
    ) -> Result<Message, MessageError> {
        Message::decode(definition, self.payload())
    }

    /// Replace the payload with the encoding of `message`.
    ///
    /// The slice is left untouched if encoding fails.
    pub fn replace_with_message(&mut self, message: &Message) -> Result<(), MessageError> {
        let payload = message.encode()?;
        self.replace_payload(payload);
        Ok(())
    }
}
