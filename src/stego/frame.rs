// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload frame construction and parsing.
//!
//! Two frame schemes share one checksum and length-prefix discipline and are
//! told apart by their magic bytes. All multi-byte integers are big-endian.
//!
//! Identity frame (`PXID`):
//!
//! ```text
//! [4 bytes] magic "PXID"
//! [1 byte ] version
//! [1 byte ] flags (caller-defined bitfield)
//! [4 bytes] route hash (u32 BE)
//! [7 bytes] build sha, ASCII, zero-padded
//! [1 byte ] view id length N
//! [N bytes] view id (UTF-8)
//! [4 bytes] timestamp, unix seconds (u32 BE)
//! [1 byte ] XOR of every byte above
//! ```
//!
//! Hierarchy frame (`PXHR`):
//!
//! ```text
//! [4 bytes] magic "PXHR"
//! [1 byte ] version
//! [1 byte ] depth
//! [1 byte ] type length  + type (UTF-8)
//! [1 byte ] id length    + id (UTF-8)
//! [1 byte ] parent length + parent id (UTF-8)
//! [2 bytes] path length (u16 BE) + path (UTF-8)
//! [1 byte ] XOR of every byte above
//! ```
//!
//! The checksum is the only validity gate. A length prefix that was corrupted
//! in transit normally shifts the checksum position as well, so it is caught
//! by the same comparison.

use crate::stego::error::FrameError;
use crate::stego::hash::{string_hash, SeedKey};

/// Magic bytes opening an identity frame.
pub const IDENTITY_MAGIC: [u8; 4] = *b"PXID";
/// Magic bytes opening a hierarchy frame.
pub const HIERARCHY_MAGIC: [u8; 4] = *b"PXHR";

pub const IDENTITY_VERSION: u8 = 1;
pub const HIERARCHY_VERSION: u8 = 1;

/// Width of the zero-padded build sha field.
pub const SHA_LEN: usize = 7;

/// Longest string a one-byte length prefix can carry.
pub const MAX_SHORT_FIELD: usize = u8::MAX as usize;
/// Longest path a two-byte length prefix can carry.
pub const MAX_PATH_LEN: usize = u16::MAX as usize;

/// Identity frame size without the view id: magic(4) + version(1) + flags(1)
/// + route hash(4) + sha(7) + length(1) + timestamp(4) + checksum(1).
pub const IDENTITY_OVERHEAD: usize = 4 + 1 + 1 + 4 + SHA_LEN + 1 + 4 + 1; // 23

/// Hierarchy frame size without its strings.
pub const HIERARCHY_OVERHEAD: usize = 4 + 1 + 1 + 1 + 1 + 1 + 2 + 1; // 12

/// Largest identity frame (255-byte view id).
pub const MAX_IDENTITY_FRAME: usize = IDENTITY_OVERHEAD + MAX_SHORT_FIELD; // 278

/// Discriminant of the frame layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeId {
    Identity,
    Hierarchy,
}

impl SchemeId {
    pub const ALL: [SchemeId; 2] = [SchemeId::Identity, SchemeId::Hierarchy];

    pub fn magic(self) -> [u8; 4] {
        match self {
            Self::Identity => IDENTITY_MAGIC,
            Self::Hierarchy => HIERARCHY_MAGIC,
        }
    }

    /// Scheme whose magic starts `bytes`, if any.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..4)?;
        Self::ALL.into_iter().find(|s| head == s.magic())
    }
}

/// Leaf identifier of a rendered view plus build metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPayload {
    pub version: u8,
    pub flags: u8,
    pub route_hash: u32,
    /// Short build identifier, at most [`SHA_LEN`] ASCII bytes.
    pub sha: String,
    pub view_id: String,
    /// Unix seconds.
    pub timestamp: u32,
}

impl IdentityPayload {
    /// Start an identity for `view_id` rendered under `route`.
    ///
    /// # Errors
    /// [`FrameError::FieldTooLong`] if `view_id` exceeds 255 UTF-8 bytes.
    pub fn new(view_id: &str, route: &str) -> Result<Self, FrameError> {
        check_len("view id", view_id, MAX_SHORT_FIELD)?;
        Ok(Self {
            version: IDENTITY_VERSION,
            flags: 0,
            route_hash: string_hash(route),
            sha: String::new(),
            view_id: view_id.to_owned(),
            timestamp: 0,
        })
    }

    /// Set the build sha. Non-ASCII characters are dropped and the rest is
    /// cut to [`SHA_LEN`] characters.
    pub fn with_sha(mut self, sha: &str) -> Self {
        self.sha = sha.chars().filter(char::is_ascii).take(SHA_LEN).collect();
        self
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Route hash as eight lowercase hex digits.
    pub fn route_hash_hex(&self) -> String {
        format!("{:08x}", self.route_hash)
    }

    /// Serialize and append the checksum. Over-long strings are cut at a
    /// character boundary rather than rejected.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = FrameWriter::new(SchemeId::Identity, self.version, IDENTITY_OVERHEAD + self.view_id.len());
        w.u8(self.flags);
        w.u32(self.route_hash);
        w.fixed_ascii(&self.sha, SHA_LEN);
        w.short_str(&self.view_id);
        w.u32(self.timestamp);
        w.finish()
    }

    fn read(r: &mut FrameReader<'_>, version: u8) -> Result<Self, FrameError> {
        let flags = r.u8()?;
        let route_hash = r.u32()?;
        let sha = r.fixed_ascii(SHA_LEN)?;
        let view_id = r.short_str()?;
        let timestamp = r.u32()?;
        Ok(Self {
            version,
            flags,
            route_hash,
            sha,
            view_id,
            timestamp,
        })
    }
}

/// A component chain: the leaf plus enough context to rebuild its position in
/// the view tree without an external registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyPayload {
    pub version: u8,
    pub depth: u8,
    /// Component type (element or component name).
    pub kind: String,
    pub id: String,
    pub parent_id: String,
    /// `/`-separated component path from the root.
    pub path: String,
}

impl HierarchyPayload {
    /// # Errors
    /// [`FrameError::FieldTooLong`] if a short field exceeds 255 bytes or the
    /// path exceeds 65535 bytes.
    pub fn new(
        path: &str,
        kind: &str,
        id: &str,
        parent_id: &str,
        depth: u8,
    ) -> Result<Self, FrameError> {
        check_len("type", kind, MAX_SHORT_FIELD)?;
        check_len("id", id, MAX_SHORT_FIELD)?;
        check_len("parent id", parent_id, MAX_SHORT_FIELD)?;
        check_len("path", path, MAX_PATH_LEN)?;
        Ok(Self {
            version: HIERARCHY_VERSION,
            depth,
            kind: kind.to_owned(),
            id: id.to_owned(),
            parent_id: parent_id.to_owned(),
            path: path.to_owned(),
        })
    }

    /// Path segments from root to leaf, empty segments skipped.
    pub fn chain(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Key that seeds this component's perceptual pattern.
    pub fn seed_key(&self) -> SeedKey {
        SeedKey::new(self.path.clone(), self.kind.clone(), u32::from(self.depth))
    }

    pub fn encode(&self) -> Vec<u8> {
        let strings = self.kind.len() + self.id.len() + self.parent_id.len() + self.path.len();
        let mut w = FrameWriter::new(SchemeId::Hierarchy, self.version, HIERARCHY_OVERHEAD + strings);
        w.u8(self.depth);
        w.short_str(&self.kind);
        w.short_str(&self.id);
        w.short_str(&self.parent_id);
        w.long_str(&self.path);
        w.finish()
    }

    fn read(r: &mut FrameReader<'_>, version: u8) -> Result<Self, FrameError> {
        let depth = r.u8()?;
        let kind = r.short_str()?;
        let id = r.short_str()?;
        let parent_id = r.short_str()?;
        let path = r.long_str()?;
        Ok(Self {
            version,
            depth,
            kind,
            id,
            parent_id,
            path,
        })
    }
}

/// One payload of either scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Identity(IdentityPayload),
    Hierarchy(HierarchyPayload),
}

impl Payload {
    pub fn scheme(&self) -> SchemeId {
        match self {
            Self::Identity(_) => SchemeId::Identity,
            Self::Hierarchy(_) => SchemeId::Hierarchy,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Identity(p) => p.encode(),
            Self::Hierarchy(p) => p.encode(),
        }
    }

    pub fn as_identity(&self) -> Option<&IdentityPayload> {
        match self {
            Self::Identity(p) => Some(p),
            Self::Hierarchy(_) => None,
        }
    }

    pub fn as_hierarchy(&self) -> Option<&HierarchyPayload> {
        match self {
            Self::Hierarchy(p) => Some(p),
            Self::Identity(_) => None,
        }
    }
}

impl From<IdentityPayload> for Payload {
    fn from(p: IdentityPayload) -> Self {
        Self::Identity(p)
    }
}

impl From<HierarchyPayload> for Payload {
    fn from(p: HierarchyPayload) -> Self {
        Self::Hierarchy(p)
    }
}

/// A frame read from a byte buffer, with its checksum verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub payload: Payload,
    /// Offset of the magic within the scanned buffer.
    pub offset: usize,
    /// Frame length including magic and checksum.
    pub len: usize,
    /// Checksum byte as stored.
    pub checksum: u8,
    /// XOR over the frame bytes as read.
    pub computed_checksum: u8,
    pub checksum_valid: bool,
}

impl DecodedFrame {
    /// The payload, only if the checksum holds.
    pub fn into_valid(self) -> Result<Payload, FrameError> {
        if self.checksum_valid {
            Ok(self.payload)
        } else {
            Err(FrameError::ChecksumMismatch {
                stored: self.checksum,
                computed: self.computed_checksum,
            })
        }
    }
}

/// XOR-reduce a byte slice.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// First offset of `magic` in `bytes`.
pub fn locate_magic(bytes: &[u8], magic: &[u8; 4]) -> Option<usize> {
    bytes.windows(magic.len()).position(|w| w == magic)
}

/// Every offset where some scheme's magic begins, in ascending order.
///
/// Pixel data can contain magic by accident, so callers try each candidate
/// until one passes the checksum.
pub fn magic_candidates(bytes: &[u8]) -> Vec<(usize, SchemeId)> {
    bytes
        .windows(4)
        .enumerate()
        .filter_map(|(i, w)| SchemeId::from_magic(w).map(|s| (i, s)))
        .collect()
}

/// Read a frame starting at `offset`, which must point at a magic.
///
/// A checksum mismatch is reported through `checksum_valid`, not as an
/// error; strings are converted lossily so a damaged frame can still be
/// inspected.
///
/// # Errors
/// - [`FrameError::UnknownMagic`] if no scheme's magic is at `offset`.
/// - [`FrameError::Truncated`] if a field runs past the end of `bytes`.
pub fn decode(bytes: &[u8], offset: usize) -> Result<DecodedFrame, FrameError> {
    let tail = bytes.get(offset..).unwrap_or_default();
    let scheme = SchemeId::from_magic(tail).ok_or(FrameError::UnknownMagic { offset })?;

    let mut r = FrameReader::new(tail);
    r.take(4)?;
    let version = r.u8()?;
    let payload = match scheme {
        SchemeId::Identity => Payload::Identity(IdentityPayload::read(&mut r, version)?),
        SchemeId::Hierarchy => Payload::Hierarchy(HierarchyPayload::read(&mut r, version)?),
    };
    let computed = xor_checksum(&tail[..r.pos]);
    let checksum = r.u8()?;

    Ok(DecodedFrame {
        payload,
        offset,
        len: r.pos,
        checksum,
        computed_checksum: computed,
        checksum_valid: checksum == computed,
    })
}

/// Like [`decode`], but a checksum mismatch is an error.
pub fn decode_valid(bytes: &[u8], offset: usize) -> Result<DecodedFrame, FrameError> {
    let frame = decode(bytes, offset)?;
    if frame.checksum_valid {
        Ok(frame)
    } else {
        Err(FrameError::ChecksumMismatch {
            stored: frame.checksum,
            computed: frame.computed_checksum,
        })
    }
}

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &bit)| byte | ((bit & 1) << (7 - i)))
        })
        .collect()
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), FrameError> {
    if value.len() > max {
        return Err(FrameError::FieldTooLong { field, len: value.len(), max });
    }
    Ok(())
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn clamp_utf8(s: &str, max: usize) -> &[u8] {
    if s.len() <= max {
        return s.as_bytes();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s.as_bytes()[..end]
}

struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    fn new(scheme: SchemeId, version: u8, capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(&scheme.magic());
        buf.push(version);
        Self { buf }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn fixed_ascii(&mut self, s: &str, width: usize) {
        let bytes = clamp_utf8(s, width);
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + width - bytes.len(), 0);
    }

    fn short_str(&mut self, s: &str) {
        let bytes = clamp_utf8(s, MAX_SHORT_FIELD);
        self.buf.push(bytes.len() as u8);
        self.buf.extend_from_slice(bytes);
    }

    fn long_str(&mut self, s: &str) {
        let bytes = clamp_utf8(s, MAX_PATH_LEN);
        self.buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(bytes);
    }

    fn finish(mut self) -> Vec<u8> {
        let checksum = xor_checksum(&self.buf);
        self.buf.push(checksum);
        self.buf
    }
}

struct FrameReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        let end = self.pos + n;
        let slice = self.data.get(self.pos..end).ok_or(FrameError::Truncated {
            needed: end,
            available: self.data.len(),
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, FrameError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FrameError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, FrameError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn fixed_ascii(&mut self, width: usize) -> Result<String, FrameError> {
        let b = self.take(width)?;
        let end = b.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
        Ok(String::from_utf8_lossy(&b[..end]).into_owned())
    }

    fn short_str(&mut self) -> Result<String, FrameError> {
        let len = self.u8()? as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn long_str(&mut self) -> Result<String, FrameError> {
        let len = self.u16()? as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }
}
