//! `IGMPv1` messages (RFC 1112 appendix I).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |Version| Type  |    Unused     |           Checksum            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Group Address                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The version and type nibbles are treated as the single type byte shared with later versions.
use crate::buffer::Buffer;
use crate::checksum::igmp_checksum;
use crate::error::Result;
use crate::igmp::types::IgmpType;
use crate::igmp::{
    check_size, check_type, CHECKSUM_OFFSET, GROUP_ADDRESS_OFFSET, HEADER_SIZE, SECOND_BYTE_OFFSET,
    TYPE_OFFSET,
};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

/// Represents an `IGMPv1` Membership Query.
///
/// The group address is always `0.0.0.0` and cannot be set.
pub struct MembershipQueryPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> MembershipQueryPacket<'a> {
    /// Bind a view to `packet`, initializing it as an `IGMPv1` Membership Query.
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        check_size("V1MembershipQueryPacket", Self::minimum_packet_size(), packet.len())?;
        let mut query = Self::bind(Buffer::Mutable(packet));
        *query.buf.write(TYPE_OFFSET) = IgmpType::MembershipQuery.id();
        *query.buf.write(SECOND_BYTE_OFFSET) = 0;
        query.buf.set_ipv4(GROUP_ADDRESS_OFFSET, Ipv4Addr::UNSPECIFIED);
        Ok(query)
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        check_size("V1MembershipQueryPacket", Self::minimum_packet_size(), packet.len())?;
        check_type(IgmpType::MembershipQuery, packet)?;
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
        IgmpType::MembershipQuery
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_group_address(&self) -> Ipv4Addr {
        self.buf.get_ipv4(GROUP_ADDRESS_OFFSET)
    }

    pub fn set_checksum(&mut self, val: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, val);
    }

    #[must_use]
    pub fn calculate_checksum(&self) -> u16 {
        igmp_checksum(&self.buf.as_slice()[..self.size()])
    }

    #[must_use]
    pub fn is_valid_checksum(&self) -> bool {
        self.get_checksum() == self.calculate_checksum()
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        HEADER_SIZE
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }
}

impl Debug for MembershipQueryPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V1MembershipQuery")
            .field("checksum", &self.get_checksum())
            .field("group_address", &self.get_group_address())
            .finish()
    }
}

/// Represents an `IGMPv1` Membership Report.
pub struct MembershipReportPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> MembershipReportPacket<'a> {
    /// Bind a view to `packet`, initializing it as an `IGMPv1` Membership Report.
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        check_size("V1MembershipReportPacket", Self::minimum_packet_size(), packet.len())?;
        let mut report = Self::bind(Buffer::Mutable(packet));
        *report.buf.write(TYPE_OFFSET) = IgmpType::V1MembershipReport.id();
        *report.buf.write(SECOND_BYTE_OFFSET) = 0;
        Ok(report)
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        check_size("V1MembershipReportPacket", Self::minimum_packet_size(), packet.len())?;
        check_type(IgmpType::V1MembershipReport, packet)?;
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
        IgmpType::V1MembershipReport
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_group_address(&self) -> Ipv4Addr {
        self.buf.get_ipv4(GROUP_ADDRESS_OFFSET)
    }

    pub fn set_checksum(&mut self, val: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, val);
    }

    pub fn set_group_address(&mut self, val: Ipv4Addr) {
        self.buf.set_ipv4(GROUP_ADDRESS_OFFSET, val);
    }

    #[must_use]
    pub fn calculate_checksum(&self) -> u16 {
        igmp_checksum(&self.buf.as_slice()[..self.size()])
    }

    #[must_use]
    pub fn is_valid_checksum(&self) -> bool {
        self.get_checksum() == self.calculate_checksum()
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        HEADER_SIZE
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }
}

impl Debug for MembershipReportPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V1MembershipReport")
            .field("checksum", &self.get_checksum())
            .field("group_address", &self.get_group_address())
            .finish()
    }
}
