use alloy_primitives::{Bytes, B256};
use alloy_rlp::Decodable;

use crate::{NevmBlock, Result, WireError};

/// Upper bound on a single length-prefixed field. Connect payloads carry one
/// EVM block; anything larger than this is framing corruption, not data.
const MAX_VAR_FIELD_LEN: usize = 8 * 1024 * 1024;

/// The connect payload: one EVM block plus the cross-chain glue the host
/// commits alongside it.
///
/// The layout is the length-prefixed format agreed with the host: compact-size
/// prefixes for variable fields, raw 32-byte digests, one boolean byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectPayload {
    /// RLP-encoded EVM block (header + body).
    pub evm_block_data: Bytes,
    /// Digest the host claims for the block; must equal the decoded header hash.
    pub evm_block_hash: B256,
    /// Root the host commits in its coinbase. The host currently commits the
    /// block's state root under this name.
    pub tx_root: B256,
    /// Identifier of the host block embedding this EVM block, carried verbatim
    /// to the indexer.
    pub host_block_hash: Bytes,
    /// False while the host is replaying; the acknowledgement is then advisory.
    pub wait_for_response: bool,
}

impl ConnectPayload {
    /// Builds a payload from a block, computing the data, hash and root fields.
    ///
    /// This is the host-side half of the codec; the bridge only ever decodes.
    pub fn from_block(
        block: &NevmBlock,
        host_block_hash: impl Into<Bytes>,
        wait_for_response: bool,
    ) -> Self {
        Self {
            evm_block_data: alloy_rlp::encode(block).into(),
            evm_block_hash: block.header.hash_slow(),
            tx_root: block.header.state_root,
            host_block_hash: host_block_hash.into(),
            wait_for_response,
        }
    }

    /// Serialises the payload into the wire layout.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.evm_block_data.len() + self.host_block_hash.len() + 80);
        write_var_bytes(&mut out, &self.evm_block_data);
        out.extend_from_slice(self.evm_block_hash.as_slice());
        out.extend_from_slice(self.tx_root.as_slice());
        write_var_bytes(&mut out, &self.host_block_hash);
        out.push(self.wait_for_response as u8);
        out
    }

    /// Deserialises a payload, rejecting truncated, over-long and trailing input.
    pub fn deserialize(input: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(input);
        let evm_block_data = reader.read_var_bytes()?;
        let evm_block_hash = reader.read_hash()?;
        let tx_root = reader.read_hash()?;
        let host_block_hash = reader.read_var_bytes()?;
        let wait_for_response = reader.read_u8()? != 0;
        reader.finish()?;
        Ok(Self { evm_block_data, evm_block_hash, tx_root, host_block_hash, wait_for_response })
    }

    /// Decodes the embedded EVM block.
    ///
    /// The block bytes must be exactly one RLP item. The digest fields are not
    /// checked here; callers cross-check against the decoded header.
    pub fn decode_block(&self) -> Result<NevmBlock> {
        let mut buf = self.evm_block_data.as_ref();
        let block = NevmBlock::decode(&mut buf)?;
        if !buf.is_empty() {
            return Err(WireError::TrailingRlp { extra: buf.len() });
        }
        Ok(block)
    }
}

/// Appends a compact-size prefix followed by the bytes themselves.
fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// Bitcoin compact-size: 1 byte below 0xfd, then 0xfd/0xfe/0xff markers for
/// 2-, 4- and 8-byte little-endian widths.
fn write_compact_size(out: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Cursor over the wire bytes with explicit bounds checking.
struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(WireError::Truncated { offset: self.offset })?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_hash(&mut self) -> Result<B256> {
        Ok(B256::from_slice(self.take(32)?))
    }

    /// Reads a compact-size prefix, enforcing the minimal encoding.
    fn read_compact_size(&mut self) -> Result<u64> {
        let start = self.offset;
        let marker = self.read_u8()?;
        let value = match marker {
            0xfd => {
                let b = self.take(2)?;
                u16::from_le_bytes([b[0], b[1]]) as u64
            }
            0xfe => {
                let b = self.take(4)?;
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64
            }
            0xff => {
                let b = self.take(8)?;
                u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
            direct => return Ok(direct as u64),
        };
        let minimal = match marker {
            0xfd => value >= 0xfd,
            0xfe => value > 0xffff,
            _ => value > 0xffff_ffff,
        };
        if !minimal {
            return Err(WireError::NonCanonicalLength { offset: start });
        }
        Ok(value)
    }

    fn read_var_bytes(&mut self) -> Result<Bytes> {
        let len = self.read_compact_size()?;
        if len > MAX_VAR_FIELD_LEN as u64 {
            return Err(WireError::FieldTooLarge { len, max: MAX_VAR_FIELD_LEN });
        }
        Ok(Bytes::copy_from_slice(self.take(len as usize)?))
    }

    fn finish(self) -> Result<()> {
        let extra = self.buf.len() - self.offset;
        if extra != 0 {
            return Err(WireError::TrailingBytes { extra });
        }
        Ok(())
    }
}
