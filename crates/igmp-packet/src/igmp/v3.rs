//! `IGMPv3` messages (RFC 3376).
use crate::buffer::Buffer;
use crate::checksum::igmp_checksum;
use crate::error::{Error, Result};
use crate::igmp::group_record::{GroupRecord, GroupRecords};
use crate::igmp::types::{IgmpType, MaxResponseCode, QueryIntervalCode, RobustnessVariable};
use crate::igmp::{
    check_size, check_type, CHECKSUM_OFFSET, GROUP_ADDRESS_OFFSET, HEADER_SIZE, SECOND_BYTE_OFFSET,
    TYPE_OFFSET,
};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const ADDRESS_SIZE: usize = 4;

const MAX_RESPONSE_CODE_OFFSET: usize = SECOND_BYTE_OFFSET;
const FLAGS_OFFSET: usize = 8;
const QQIC_OFFSET: usize = 9;
const NUMBER_OF_SOURCES_OFFSET: usize = 10;
const SOURCE_ADDRESSES_OFFSET: usize = 12;

const RESERVED_MASK: u8 = 0xf0;
const SUPPRESS_FLAG_MASK: u8 = 0x08;
const QRV_MASK: u8 = 0x07;

/// Represents an `IGMPv3` Membership Query.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Type = 0x11  | Max Resp Code |           Checksum            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Group Address                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | Resv  |S| QRV |     QQIC      |     Number of Sources (N)     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Source Address [1] .. [N]                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
pub struct MembershipQueryPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> MembershipQueryPacket<'a> {
    /// Bind a view to `packet`, initializing it as an `IGMPv3` Membership Query.
    ///
    /// The reserved bits are cleared, all other bytes are left as found.
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        check_size("V3MembershipQueryPacket", Self::minimum_packet_size(), packet.len())?;
        let mut query = Self::bind(Buffer::Mutable(packet));
        *query.buf.write(TYPE_OFFSET) = IgmpType::MembershipQuery.id();
        *query.buf.write(FLAGS_OFFSET) = query.buf.read(FLAGS_OFFSET) & !RESERVED_MASK;
        Ok(query)
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        check_size("V3MembershipQueryPacket", Self::minimum_packet_size(), packet.len())?;
        check_type(IgmpType::MembershipQuery, packet)?;
        Ok(Self::bind(Buffer::Immutable(packet)))
    }

    pub(crate) const fn bind(buf: Buffer<'a>) -> Self {
        Self { buf }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        SOURCE_ADDRESSES_OFFSET
    }

    #[must_use]
    pub const fn get_igmp_type(&self) -> IgmpType {
        IgmpType::MembershipQuery
    }

    /// The Max Resp Code, which may be zero on the wire.
    #[must_use]
    pub fn get_max_response_code(&self) -> MaxResponseCode {
        MaxResponseCode::from_wire(self.buf.read(MAX_RESPONSE_CODE_OFFSET))
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_group_address(&self) -> Ipv4Addr {
        self.buf.get_ipv4(GROUP_ADDRESS_OFFSET)
    }

    #[must_use]
    pub fn get_suppress_router_side_processing(&self) -> bool {
        self.buf.read(FLAGS_OFFSET) & SUPPRESS_FLAG_MASK != 0
    }

    #[must_use]
    pub fn get_robustness_variable(&self) -> RobustnessVariable {
        RobustnessVariable::from_wire(self.buf.read(FLAGS_OFFSET))
    }

    #[must_use]
    pub fn get_query_interval_code(&self) -> QueryIntervalCode {
        QueryIntervalCode::new(self.buf.read(QQIC_OFFSET))
    }

    #[must_use]
    pub fn get_number_of_sources(&self) -> u16 {
        self.buf.get_u16(NUMBER_OF_SOURCES_OFFSET)
    }

    /// The source addresses, as many as the source count declares and the buffer holds.
    #[must_use]
    pub fn get_source_addresses(&self) -> Vec<Ipv4Addr> {
        let count = usize::from(self.get_number_of_sources());
        self.buf.as_slice()[SOURCE_ADDRESSES_OFFSET..]
            .chunks_exact(ADDRESS_SIZE)
            .take(count)
            .map(|octets| Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
            .collect()
    }

    pub fn set_max_response_code(&mut self, val: MaxResponseCode) {
        *self.buf.write(MAX_RESPONSE_CODE_OFFSET) = val.code();
    }

    pub fn set_checksum(&mut self, val: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, val);
    }

    pub fn set_group_address(&mut self, val: Ipv4Addr) {
        self.buf.set_ipv4(GROUP_ADDRESS_OFFSET, val);
    }

    pub fn set_suppress_router_side_processing(&mut self, val: bool) {
        let flags = self.buf.read(FLAGS_OFFSET) & !SUPPRESS_FLAG_MASK;
        *self.buf.write(FLAGS_OFFSET) = if val {
            flags | SUPPRESS_FLAG_MASK
        } else {
            flags
        };
    }

    pub fn set_robustness_variable(&mut self, val: RobustnessVariable) {
        *self.buf.write(FLAGS_OFFSET) = (self.buf.read(FLAGS_OFFSET) & !QRV_MASK) | val.value();
    }

    pub fn set_query_interval_code(&mut self, val: QueryIntervalCode) {
        *self.buf.write(QQIC_OFFSET) = val.code();
    }

    /// Write the source addresses followed by their count.
    ///
    /// Nothing is written if the buffer cannot hold every address.
    pub fn set_source_addresses(&mut self, addresses: &[Ipv4Addr]) -> Result<()> {
        let count = u16::try_from(addresses.len()).map_err(|_| {
            Error::RangeError(format!(
                "membership query cannot hold more than {} sources: {}",
                u16::MAX,
                addresses.len()
            ))
        })?;
        let required = SOURCE_ADDRESSES_OFFSET + ADDRESS_SIZE * addresses.len();
        check_size("V3MembershipQueryPacket", required, self.buf.len())?;
        for (i, addr) in addresses.iter().enumerate() {
            self.buf
                .set_ipv4(SOURCE_ADDRESSES_OFFSET + ADDRESS_SIZE * i, *addr);
        }
        self.buf.set_u16(NUMBER_OF_SOURCES_OFFSET, count);
        Ok(())
    }

    #[must_use]
    pub fn calculate_checksum(&self) -> u16 {
        igmp_checksum(&self.buf.as_slice()[..self.size()])
    }

    #[must_use]
    pub fn is_valid_checksum(&self) -> bool {
        self.get_checksum() == self.calculate_checksum()
    }

    /// The size of the query as declared by its source count, bounded by the buffer.
    #[must_use]
    pub fn size(&self) -> usize {
        let declared =
            SOURCE_ADDRESSES_OFFSET + ADDRESS_SIZE * usize::from(self.get_number_of_sources());
        declared.min(self.buf.len())
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }
}

impl Debug for MembershipQueryPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V3MembershipQuery")
            .field("max_response_time", &self.get_max_response_code().duration())
            .field("checksum", &self.get_checksum())
            .field("group_address", &self.get_group_address())
            .field(
                "suppress_router_side_processing",
                &self.get_suppress_router_side_processing(),
            )
            .field("robustness_variable", &self.get_robustness_variable().value())
            .field("query_interval", &self.get_query_interval_code().duration())
            .field("source_addresses", &self.get_source_addresses())
            .finish()
    }
}

const REPORT_RESERVED_OFFSET: usize = 4;
const NUMBER_OF_GROUP_RECORDS_OFFSET: usize = 6;
const GROUP_RECORDS_OFFSET: usize = 8;

/// Represents an `IGMPv3` Membership Report.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Type = 0x22  |    Reserved   |           Checksum            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Reserved            |  Number of Group Records (M)  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Group Record [1] .. [M]                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
pub struct MembershipReportPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> MembershipReportPacket<'a> {
    /// Bind a view to `packet`, initializing it as an `IGMPv3` Membership Report.
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        check_size("V3MembershipReportPacket", Self::minimum_packet_size(), packet.len())?;
        let mut report = Self::bind(Buffer::Mutable(packet));
        *report.buf.write(TYPE_OFFSET) = IgmpType::V3MembershipReport.id();
        *report.buf.write(SECOND_BYTE_OFFSET) = 0;
        report.buf.set_u16(REPORT_RESERVED_OFFSET, 0);
        Ok(report)
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        check_size("V3MembershipReportPacket", Self::minimum_packet_size(), packet.len())?;
        check_type(IgmpType::V3MembershipReport, packet)?;
        Ok(Self::bind(Buffer::Immutable(packet)))
    }

    pub(crate) const fn bind(buf: Buffer<'a>) -> Self {
        Self { buf }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        HEADER_SIZE
    }

    #[must_use]
    pub const fn get_igmp_type(&self) -> IgmpType {
        IgmpType::V3MembershipReport
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_number_of_group_records(&self) -> u16 {
        self.buf.get_u16(NUMBER_OF_GROUP_RECORDS_OFFSET)
    }

    /// Lazily decode the group records.
    ///
    /// The returned iterator can be cloned to walk the records again.
    #[must_use]
    pub fn group_records(&self) -> GroupRecords<'_> {
        GroupRecords::new(
            &self.buf.as_slice()[GROUP_RECORDS_OFFSET..],
            self.get_number_of_group_records(),
        )
    }

    pub fn set_checksum(&mut self, val: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, val);
    }

    /// Lay out `records` after the header and then write their count.
    ///
    /// Every record is validated and the total size checked before anything is written.
    pub fn set_group_records(&mut self, records: &[GroupRecord]) -> Result<()> {
        let count = u16::try_from(records.len()).map_err(|_| {
            Error::RangeError(format!(
                "membership report cannot hold more than {} group records: {}",
                u16::MAX,
                records.len()
            ))
        })?;
        for record in records {
            record.validate()?;
        }
        let required = GROUP_RECORDS_OFFSET + records.iter().map(GroupRecord::size).sum::<usize>();
        check_size("V3MembershipReportPacket", required, self.buf.len())?;
        let mut offset = GROUP_RECORDS_OFFSET;
        for record in records {
            offset += record.encode(&mut self.buf.as_slice_mut()[offset..])?;
        }
        self.buf.set_u16(NUMBER_OF_GROUP_RECORDS_OFFSET, count);
        Ok(())
    }

    #[must_use]
    pub fn calculate_checksum(&self) -> u16 {
        igmp_checksum(&self.buf.as_slice()[..self.size()])
    }

    #[must_use]
    pub fn is_valid_checksum(&self) -> bool {
        self.get_checksum() == self.calculate_checksum()
    }

    /// The size of the report found by walking the group record chain, bounded by the buffer.
    #[must_use]
    pub fn size(&self) -> usize {
        let buf = self.buf.as_slice();
        let mut offset = GROUP_RECORDS_OFFSET;
        for _ in 0..self.get_number_of_group_records() {
            match GroupRecord::encoded_size(&buf[offset.min(buf.len())..]) {
                Ok(size) => offset += size,
                Err(_) => break,
            }
        }
        offset.min(buf.len())
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }
}

impl Debug for MembershipReportPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V3MembershipReport")
            .field("checksum", &self.get_checksum())
            .field("number_of_group_records", &self.get_number_of_group_records())
            .field("group_records", &self.group_records().collect::<Vec<_>>())
            .finish()
    }
}
