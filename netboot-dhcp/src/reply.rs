//! Stored server replies read back from disk.

use std::fs;
use std::path::Path;

use dhcproto::error::DecodeError;
use dhcproto::{v4, v6, Decodable, Decoder};
use netboot_core::{ExtractNetConf, NetConf, NetConfError};
use thiserror::Error;

/// Protocol version of a stored reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    V4,
    V6,
}

/// Errors returned when reading a stored reply.
#[derive(Debug, Error)]
pub enum ReplyDecodeError {
    #[error("failed to read reply file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode {protocol} reply from {path}: {source}")]
    Decode {
        path: String,
        protocol: &'static str,
        source: DecodeError,
    },
}

/// A decoded reply of either protocol version.
#[derive(Debug)]
pub enum StoredReply {
    V4(v4::Message),
    V6(v6::Message),
}

impl ExtractNetConf for StoredReply {
    fn net_conf(&self) -> Result<NetConf, NetConfError> {
        match self {
            StoredReply::V4(msg) => msg.net_conf(),
            StoredReply::V6(msg) => msg.net_conf(),
        }
    }
}

/// Read and decode the raw datagram stored at `path`.
pub fn load_reply(path: &Path, protocol: Protocol) -> Result<StoredReply, ReplyDecodeError> {
    let bytes = fs::read(path).map_err(|source| ReplyDecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_reply(&bytes, protocol).map_err(|source| ReplyDecodeError::Decode {
        path: path.display().to_string(),
        protocol: match protocol {
            Protocol::V4 => "DHCPv4",
            Protocol::V6 => "DHCPv6",
        },
        source,
    })
}

pub fn decode_reply(bytes: &[u8], protocol: Protocol) -> Result<StoredReply, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    Ok(match protocol {
        Protocol::V4 => StoredReply::V4(v4::Message::decode(&mut decoder)?),
        Protocol::V6 => StoredReply::V6(v6::Message::decode(&mut decoder)?),
    })
}
