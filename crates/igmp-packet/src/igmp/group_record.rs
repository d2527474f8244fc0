use crate::error::{Error, Result};
use crate::igmp::types::{AuxiliaryWord, RecordType};
use std::net::Ipv4Addr;

const RECORD_TYPE_OFFSET: usize = 0;
const AUX_DATA_LEN_OFFSET: usize = 1;
const NUMBER_OF_SOURCES_OFFSET: usize = 2;
const MULTICAST_ADDRESS_OFFSET: usize = 4;
const SOURCE_ADDRESSES_OFFSET: usize = 8;

const ADDRESS_SIZE: usize = 4;

/// An `IGMPv3` group record.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Record Type  |  Aux Data Len |     Number of Sources (N)     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Multicast Address                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Source Address [1] .. [N]                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Auxiliary Data                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Unlike the message views this is an owned value, it is decoded from and encoded to a byte
/// region explicitly.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GroupRecord {
    pub record_type: RecordType,
    pub multicast_address: Ipv4Addr,
    pub source_addresses: Vec<Ipv4Addr>,
    pub auxiliary_data: Vec<AuxiliaryWord>,
}

impl GroupRecord {
    /// The size of a record with no sources and no auxiliary data.
    pub const HEADER_SIZE: usize = SOURCE_ADDRESSES_OFFSET;

    /// The largest number of sources a record can carry.
    pub const MAX_SOURCES: usize = u16::MAX as usize;

    /// The largest number of auxiliary words a record can carry.
    pub const MAX_AUXILIARY_WORDS: usize = u8::MAX as usize;

    #[must_use]
    pub const fn new(record_type: RecordType, multicast_address: Ipv4Addr) -> Self {
        Self {
            record_type,
            multicast_address,
            source_addresses: Vec::new(),
            auxiliary_data: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source_addresses(mut self, source_addresses: impl Into<Vec<Ipv4Addr>>) -> Self {
        self.source_addresses = source_addresses.into();
        self
    }

    #[must_use]
    pub fn with_auxiliary_data(mut self, auxiliary_data: impl Into<Vec<AuxiliaryWord>>) -> Self {
        self.auxiliary_data = auxiliary_data.into();
        self
    }

    /// The encoded size of the record in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE
            + ADDRESS_SIZE * self.source_addresses.len()
            + AuxiliaryWord::SIZE * self.auxiliary_data.len()
    }

    /// Check the source and auxiliary data counts fit their wire fields.
    pub fn validate(&self) -> Result<()> {
        if self.source_addresses.len() > Self::MAX_SOURCES {
            return Err(Error::RangeError(format!(
                "group record cannot hold more than {} sources: {}",
                Self::MAX_SOURCES,
                self.source_addresses.len()
            )));
        }
        if self.auxiliary_data.len() > Self::MAX_AUXILIARY_WORDS {
            return Err(Error::RangeError(format!(
                "group record cannot hold more than {} auxiliary words: {}",
                Self::MAX_AUXILIARY_WORDS,
                self.auxiliary_data.len()
            )));
        }
        Ok(())
    }

    /// Encode the record into the start of `buf`, returning the number of bytes written.
    ///
    /// Nothing is written if the record is invalid or `buf` is too small.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        self.validate()?;
        let size = self.size();
        if buf.len() < size {
            return Err(Error::InsufficientPacketBuffer(
                String::from("GroupRecord"),
                size,
                buf.len(),
            ));
        }
        buf[RECORD_TYPE_OFFSET] = self.record_type.id();
        buf[AUX_DATA_LEN_OFFSET] = self.auxiliary_data.len() as u8;
        buf[NUMBER_OF_SOURCES_OFFSET..MULTICAST_ADDRESS_OFFSET]
            .copy_from_slice(&(self.source_addresses.len() as u16).to_be_bytes());
        buf[MULTICAST_ADDRESS_OFFSET..SOURCE_ADDRESSES_OFFSET]
            .copy_from_slice(&self.multicast_address.octets());
        let words = self
            .source_addresses
            .iter()
            .map(Ipv4Addr::octets)
            .chain(self.auxiliary_data.iter().map(|word| word.bytes()));
        for (chunk, word) in buf[SOURCE_ADDRESSES_OFFSET..size]
            .chunks_exact_mut(ADDRESS_SIZE)
            .zip(words)
        {
            chunk.copy_from_slice(&word);
        }
        Ok(size)
    }

    /// Encode the record into a new byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0; self.size()];
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode a record from the start of `buf`, returning it and the number of bytes it occupies.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let size = Self::encoded_size(buf)?;
        if buf.len() < size {
            return Err(Error::InsufficientPacketBuffer(
                String::from("GroupRecord"),
                size,
                buf.len(),
            ));
        }
        let record_type = RecordType::try_from(buf[RECORD_TYPE_OFFSET])?;
        let multicast_address = read_ipv4(buf, MULTICAST_ADDRESS_OFFSET);
        let number_of_sources = usize::from(read_u16(buf, NUMBER_OF_SOURCES_OFFSET));
        let aux_offset = SOURCE_ADDRESSES_OFFSET + ADDRESS_SIZE * number_of_sources;
        let source_addresses = buf[SOURCE_ADDRESSES_OFFSET..aux_offset]
            .chunks_exact(ADDRESS_SIZE)
            .map(|octets| Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
            .collect();
        let auxiliary_data = AuxiliaryWord::from_bytes(&buf[aux_offset..size])?;
        Ok((
            Self {
                record_type,
                multicast_address,
                source_addresses,
                auxiliary_data,
            },
            size,
        ))
    }

    /// The size of the record at the start of `buf` as declared by its own count fields.
    pub(crate) fn encoded_size(buf: &[u8]) -> Result<usize> {
        if buf.len() < Self::HEADER_SIZE {
            return Err(Error::InsufficientPacketBuffer(
                String::from("GroupRecord"),
                Self::HEADER_SIZE,
                buf.len(),
            ));
        }
        let aux_words = usize::from(buf[AUX_DATA_LEN_OFFSET]);
        let number_of_sources = usize::from(read_u16(buf, NUMBER_OF_SOURCES_OFFSET));
        Ok(Self::HEADER_SIZE
            + ADDRESS_SIZE * number_of_sources
            + AuxiliaryWord::SIZE * aux_words)
    }
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn read_ipv4(buf: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    )
}

/// A forward-only, restartable cursor over a run of encoded group records.
///
/// Each record is located from the counts in the record before it. Iteration stops after
/// `count` records or after the first record which cannot be decoded.
#[derive(Debug, Clone)]
pub struct GroupRecords<'a> {
    buf: &'a [u8],
    remaining: u16,
    failed: bool,
}

impl<'a> GroupRecords<'a> {
    pub(crate) const fn new(buf: &'a [u8], count: u16) -> Self {
        Self {
            buf,
            remaining: count,
            failed: false,
        }
    }
}

impl Iterator for GroupRecords<'_> {
    type Item = Result<GroupRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.failed {
            return None;
        }
        self.remaining -= 1;
        match GroupRecord::decode(self.buf) {
            Ok((record, size)) => {
                self.buf = &self.buf[size..];
                Some(Ok(record))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(usize::from(self.remaining)))
        }
    }
}
