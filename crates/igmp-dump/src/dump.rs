use crate::config::{ChecksumMode, DumpConfig};
use anyhow::{anyhow, Context};
use igmp_packet::fmt_payload;
use igmp_packet::igmp::{parse_ipv4_packet, GroupRecord, IgmpMessage};
use igmp_packet::ipv4::Ipv4Packet;
use itertools::Itertools;
use std::fmt::Write;
use tracing::instrument;

/// The outcome of checking a message checksum.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChecksumStatus {
    Valid,
    Invalid { calculated: u16 },
    Unchecked,
}

/// Decode the `IGMP` message in a captured frame and describe it.
#[instrument(skip(cfg, frame), fields(frame_len = frame.len()), level = "trace")]
pub fn dump_frame(cfg: &DumpConfig, frame: &[u8]) -> anyhow::Result<String> {
    let ip_bytes = frame.get(cfg.link_header_len..).ok_or_else(|| {
        anyhow!(
            "frame of {} bytes is shorter than the link header ({} bytes)",
            frame.len(),
            cfg.link_header_len
        )
    })?;
    let ipv4 = Ipv4Packet::new_view(ip_bytes).context("failed to read IPv4 header")?;
    if ipv4.get_version() != 4 {
        return Err(anyhow!("not an IPv4 packet, version: {}", ipv4.get_version()));
    }
    tracing::debug!(?ipv4);
    let message = parse_ipv4_packet(&ipv4).context("failed to decode IGMP message")?;
    let status = check_checksum(cfg.checksum_mode, &message)?;
    let mut out = format!(
        "{} -> {} IGMPv{} {} ({} bytes) checksum {:#06x} {}",
        ipv4.get_source(),
        ipv4.get_destination(),
        message.version(),
        message.igmp_type(),
        message.size(),
        message.get_checksum(),
        fmt_status(status),
    );
    if let Some(summary) = summarize(&message) {
        write!(out, "\n  {summary}")?;
    }
    if cfg.show_bytes {
        let bytes = &message.packet()[..message.size()];
        write!(out, "\n  bytes: {}", fmt_payload(bytes))?;
    }
    if cfg.detail {
        write!(out, "\n  {message:?}")?;
    }
    Ok(out)
}

fn check_checksum(mode: ChecksumMode, message: &IgmpMessage<'_>) -> anyhow::Result<ChecksumStatus> {
    if mode == ChecksumMode::Ignore {
        return Ok(ChecksumStatus::Unchecked);
    }
    let stored = message.get_checksum();
    let calculated = message.calculate_checksum();
    if stored == calculated {
        return Ok(ChecksumStatus::Valid);
    }
    match mode {
        ChecksumMode::Strict => Err(anyhow!(
            "invalid IGMP checksum, stored={stored:#06x}, calculated={calculated:#06x}"
        )),
        _ => {
            tracing::warn!(stored, calculated, "invalid IGMP checksum");
            Ok(ChecksumStatus::Invalid { calculated })
        }
    }
}

fn fmt_status(status: ChecksumStatus) -> String {
    match status {
        ChecksumStatus::Valid => String::from("[valid]"),
        ChecksumStatus::Invalid { calculated } => {
            format!("[invalid, expected {calculated:#06x}]")
        }
        ChecksumStatus::Unchecked => String::from("[unchecked]"),
    }
}

/// A one line description of the fields which matter for each message.
fn summarize(message: &IgmpMessage<'_>) -> Option<String> {
    match message {
        IgmpMessage::V1Query(_) => None,
        IgmpMessage::V1Report(p) => Some(format!("group {}", p.get_group_address())),
        IgmpMessage::V2Query(p) => Some(format!(
            "group {} max response time {:?}",
            p.get_group_address(),
            p.get_max_response_time().duration()
        )),
        IgmpMessage::V2Report(p) => Some(format!("group {}", p.get_group_address())),
        IgmpMessage::V2LeaveGroup(p) => Some(format!("group {}", p.get_group_address())),
        IgmpMessage::V3Query(p) => Some(format!(
            "group {} max response time {:?} qrv {} qqi {:?}{} sources [{}]",
            p.get_group_address(),
            p.get_max_response_code().duration(),
            p.get_robustness_variable().value(),
            p.get_query_interval_code().duration(),
            if p.get_suppress_router_side_processing() {
                " suppress"
            } else {
                ""
            },
            p.get_source_addresses().iter().join(", ")
        )),
        IgmpMessage::V3Report(p) => Some(
            p.group_records()
                .map(|record| match record {
                    Ok(record) => fmt_group_record(&record),
                    Err(err) => format!("<{err}>"),
                })
                .join("\n  "),
        ),
    }
}

fn fmt_group_record(record: &GroupRecord) -> String {
    format!(
        "{:?} {} sources [{}] aux [{}]",
        record.record_type,
        record.multicast_address,
        record.source_addresses.iter().join(", "),
        record
            .auxiliary_data
            .iter()
            .map(|word| fmt_payload(&word.bytes()))
            .join(", ")
    )
}
