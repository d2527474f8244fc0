//! `IGMPv2` messages (RFC 2236).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Type     | Max Resp Time |           Checksum            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Group Address                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Only the Membership Query carries a non-zero Max Resp Time.
use crate::buffer::Buffer;
use crate::checksum::igmp_checksum;
use crate::error::Result;
use crate::igmp::types::{IgmpType, ResponseTime};
use crate::igmp::{
    check_size, check_type, CHECKSUM_OFFSET, GROUP_ADDRESS_OFFSET, HEADER_SIZE, SECOND_BYTE_OFFSET,
    TYPE_OFFSET,
};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const MAX_RESPONSE_TIME_OFFSET: usize = SECOND_BYTE_OFFSET;

/// Represents an `IGMPv2` Membership Query.
///
/// A group address of `0.0.0.0` denotes a General Query.
pub struct MembershipQueryPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> MembershipQueryPacket<'a> {
    /// Bind a view to `packet`, initializing it as an `IGMPv2` Membership Query.
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        check_size("V2MembershipQueryPacket", Self::minimum_packet_size(), packet.len())?;
        let mut query = Self::bind(Buffer::Mutable(packet));
        *query.buf.write(TYPE_OFFSET) = IgmpType::MembershipQuery.id();
        Ok(query)
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        check_size("V2MembershipQueryPacket", Self::minimum_packet_size(), packet.len())?;
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
    pub fn get_max_response_time(&self) -> ResponseTime {
        ResponseTime::new(self.buf.read(MAX_RESPONSE_TIME_OFFSET))
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_group_address(&self) -> Ipv4Addr {
        self.buf.get_ipv4(GROUP_ADDRESS_OFFSET)
    }

    pub fn set_max_response_time(&mut self, val: ResponseTime) {
        *self.buf.write(MAX_RESPONSE_TIME_OFFSET) = val.value();
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

impl Debug for MembershipQueryPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V2MembershipQuery")
            .field("max_response_time", &self.get_max_response_time().duration())
            .field("checksum", &self.get_checksum())
            .field("group_address", &self.get_group_address())
            .finish()
    }
}

/// Represents an `IGMPv2` Membership Report.
pub struct MembershipReportPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> MembershipReportPacket<'a> {
    /// Bind a view to `packet`, initializing it as an `IGMPv2` Membership Report.
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        check_size("V2MembershipReportPacket", Self::minimum_packet_size(), packet.len())?;
        let mut report = Self::bind(Buffer::Mutable(packet));
        *report.buf.write(TYPE_OFFSET) = IgmpType::V2MembershipReport.id();
        *report.buf.write(MAX_RESPONSE_TIME_OFFSET) = ResponseTime::ZERO.value();
        Ok(report)
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        check_size("V2MembershipReportPacket", Self::minimum_packet_size(), packet.len())?;
        check_type(IgmpType::V2MembershipReport, packet)?;
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
        IgmpType::V2MembershipReport
    }

    /// The stored Max Resp Time, which senders set to zero.
    #[must_use]
    pub fn get_max_response_time(&self) -> ResponseTime {
        ResponseTime::new(self.buf.read(MAX_RESPONSE_TIME_OFFSET))
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
        f.debug_struct("V2MembershipReport")
            .field("checksum", &self.get_checksum())
            .field("group_address", &self.get_group_address())
            .finish()
    }
}

/// Represents an `IGMPv2` Leave Group message.
pub struct LeaveGroupPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> LeaveGroupPacket<'a> {
    /// Bind a view to `packet`, initializing it as an `IGMPv2` Leave Group.
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        check_size("LeaveGroupPacket", Self::minimum_packet_size(), packet.len())?;
        let mut leave = Self::bind(Buffer::Mutable(packet));
        *leave.buf.write(TYPE_OFFSET) = IgmpType::LeaveGroup.id();
        *leave.buf.write(MAX_RESPONSE_TIME_OFFSET) = ResponseTime::ZERO.value();
        Ok(leave)
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        check_size("LeaveGroupPacket", Self::minimum_packet_size(), packet.len())?;
        check_type(IgmpType::LeaveGroup, packet)?;
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
        IgmpType::LeaveGroup
    }

    /// The stored Max Resp Time, which senders set to zero.
    #[must_use]
    pub fn get_max_response_time(&self) -> ResponseTime {
        ResponseTime::new(self.buf.read(MAX_RESPONSE_TIME_OFFSET))
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

impl Debug for LeaveGroupPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V2LeaveGroup")
            .field("checksum", &self.get_checksum())
            .field("group_address", &self.get_group_address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use hex_literal::hex;
    use std::time::Duration;

    #[test]
    fn test_general_query_view() {
        let buf = hex!("11 64 ee 9b 00 00 00 00");
        let query = MembershipQueryPacket::new_view(&buf).unwrap();
        assert_eq!(IgmpType::MembershipQuery, query.get_igmp_type());
        assert_eq!(100, query.get_max_response_time().value());
        assert_eq!(Duration::from_secs(10), query.get_max_response_time().duration());
        assert_eq!(0xee9b, query.get_checksum());
        assert_eq!(Ipv4Addr::UNSPECIFIED, query.get_group_address());
        assert!(query.is_valid_checksum());
    }

    #[test]
    fn test_new_group_specific_query() {
        let mut buf = [0_u8; MembershipQueryPacket::minimum_packet_size()];
        let mut query = MembershipQueryPacket::new(&mut buf).unwrap();
        let time = ResponseTime::from_duration(Duration::from_millis(11_100)).unwrap();
        query.set_max_response_time(time);
        query.set_group_address(Ipv4Addr::new(224, 0, 0, 1));
        query.set_checksum(query.calculate_checksum());
        assert_eq!(0x0e8f, query.get_checksum());
        assert_eq!(time, query.get_max_response_time());
        assert_eq!(&hex!("11 6f 0e 8f e0 00 00 01"), query.packet());
    }

    #[test]
    fn test_new_report() {
        let mut buf = [0xff_u8; MembershipReportPacket::minimum_packet_size()];
        let mut report = MembershipReportPacket::new(&mut buf).unwrap();
        assert_eq!(ResponseTime::ZERO, report.get_max_response_time());
        report.set_group_address(Ipv4Addr::new(224, 0, 0, 1));
        report.set_checksum(report.calculate_checksum());
        assert_eq!(&hex!("16 00 09 fe e0 00 00 01"), report.packet());
        assert!(report.is_valid_checksum());
    }

    #[test]
    fn test_report_view() {
        let buf = hex!("16 00 09 fe e0 00 00 01");
        let report = MembershipReportPacket::new_view(&buf).unwrap();
        assert_eq!(IgmpType::V2MembershipReport, report.get_igmp_type());
        assert_eq!(Ipv4Addr::new(224, 0, 0, 1), report.get_group_address());
        assert_eq!(0x09fe, report.get_checksum());
        assert!(report.is_valid_checksum());
    }

    #[test]
    fn test_new_leave_group() {
        let mut buf = [0xff_u8; LeaveGroupPacket::minimum_packet_size()];
        let mut leave = LeaveGroupPacket::new(&mut buf).unwrap();
        leave.set_group_address(Ipv4Addr::new(239, 255, 255, 250));
        leave.set_checksum(leave.calculate_checksum());
        assert_eq!(IgmpType::LeaveGroup, leave.get_igmp_type());
        assert_eq!(ResponseTime::ZERO, leave.get_max_response_time());
        assert_eq!(0xf904, leave.get_checksum());
        assert_eq!(&hex!("17 00 f9 04 ef ff ff fa"), leave.packet());
    }

    #[test]
    fn test_leave_group_invalid_checksum() {
        let buf = hex!("17 00 f9 05 ef ff ff fa");
        let leave = LeaveGroupPacket::new_view(&buf).unwrap();
        assert_eq!(Ipv4Addr::new(239, 255, 255, 250), leave.get_group_address());
        assert!(!leave.is_valid_checksum());
    }

    #[test]
    fn test_checksum_is_idempotent() {
        let mut buf = hex!("16 00 00 00 e0 00 00 01");
        let mut report = MembershipReportPacket::new(&mut buf).unwrap();
        report.set_checksum(report.calculate_checksum());
        let first = report.get_checksum();
        report.set_checksum(report.calculate_checksum());
        assert_eq!(first, report.get_checksum());
        assert!(report.is_valid_checksum());
    }

    #[test]
    fn test_view_type_mismatch() {
        let buf = hex!("17 00 f9 04 ef ff ff fa");
        assert_eq!(
            Error::TypeMismatch(0x16, 0x17),
            MembershipReportPacket::new_view(&buf).unwrap_err()
        );
    }

    #[test]
    fn test_new_view_insufficient_buffer() {
        let buf = [0_u8; 4];
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("LeaveGroupPacket"), 8, 4),
            LeaveGroupPacket::new_view(&buf).unwrap_err()
        );
    }
}
