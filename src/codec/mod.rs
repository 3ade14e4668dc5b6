//! Serialization and chain detection
//!
//! This module contains the byte-level machinery:
//! - Packer/Unpacker (big-endian wire primitives, strict reads)
//! - Chain detection (trial decoding across the three chain codecs)

pub mod detect;
pub mod packer;

pub use detect::{decode_transaction, detect_chain, extract_network_id, UNKNOWN_NETWORK_ID};
pub use packer::{CodecError, Packer, Unpacker, CODEC_VERSION};
