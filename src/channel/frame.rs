//! Wire format for channel messages.
//!
//! Every message is a fixed 9-byte header followed by its payload:
//! ```text
//! ┌─────────┬──────────────────┬──────────────┬───────────────┐
//! │ 1 byte  │ 4 bytes          │ 4 bytes      │ N bytes       │
//! │ kind    │ conversation (BE)│ length (BE)  │ payload       │
//! └─────────┴──────────────────┴──────────────┴───────────────┘
//! ```
//!
//! - `Data` (0x01): one unit of work or its reply. May be empty.
//! - `End` (0x02): stream terminator, always zero-length.

/// Frame kind discriminants
pub const FRAME_DATA: u8 = 0x01;
pub const FRAME_END: u8 = 0x02;

pub const HEADER_LEN: usize = 9;

/// Largest payload a peer may announce.
pub const MAX_PAYLOAD_LEN: u32 = 64 * 1024 * 1024;

/// Conversation used when the configuration does not pick one.
pub const DEFAULT_CONVERSATION: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Vec<u8>),
    End,
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: u8,
    pub conversation: u32,
    pub len: u32,
}

impl Frame {
    /// Encode the frame, header included.
    pub fn encode(&self, conversation: u32) -> Vec<u8> {
        let (kind, payload): (u8, &[u8]) = match self {
            Frame::Data(payload) => (FRAME_DATA, payload.as_slice()),
            Frame::End => (FRAME_END, &[][..]),
        };

        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.push(kind);
        buf.extend_from_slice(&conversation.to_be_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Frame::End)
    }
}

impl FrameHeader {
    /// Parse and validate a header against the expected conversation.
    pub fn parse(raw: &[u8; HEADER_LEN], expected_conversation: u32) -> Result<Self, String> {
        let header = Self {
            kind: raw[0],
            conversation: u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]),
            len: u32::from_be_bytes([raw[5], raw[6], raw[7], raw[8]]),
        };

        if header.conversation != expected_conversation {
            return Err(format!(
                "conversation {} does not match expected {}",
                header.conversation, expected_conversation
            ));
        }

        match header.kind {
            FRAME_DATA if header.len > MAX_PAYLOAD_LEN => Err(format!(
                "payload of {} bytes exceeds limit of {}",
                header.len, MAX_PAYLOAD_LEN
            )),
            FRAME_DATA => Ok(header),
            FRAME_END if header.len != 0 => {
                Err(format!("end frame carries {} payload bytes", header.len))
            }
            FRAME_END => Ok(header),
            other => Err(format!("unknown frame kind: {:#04x}", other)),
        }
    }
}
