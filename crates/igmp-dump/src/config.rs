use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Decode IGMP messages from Wireshark hex dumps of captured frames
#[derive(Parser, Debug)]
#[command(name = "igmp-dump", author, version, about, long_about = None, arg_required_else_help(true))]
pub struct Args {
    /// One or more hex dump files, each holding a single frame
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// The number of link layer bytes preceding the IPv4 header [default: 14]
    #[arg(short = 'l', long)]
    pub link_header_len: Option<usize>,

    /// How to treat an invalid IGMP checksum [default: warn]
    #[arg(value_enum, short = 'c', long)]
    pub checksum: Option<ChecksumMode>,

    /// Print the bytes of each IGMP message
    #[arg(short = 'b', long, default_value_t = false)]
    pub show_bytes: bool,

    /// Print every decoded field of each IGMP message
    #[arg(short = 'd', long, default_value_t = false)]
    pub detail: bool,

    /// The debug log format [default: pretty]
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: igmp_packet=debug,igmp_dump=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// The debug log span events [default: off]
    #[arg(long)]
    pub log_span_events: Option<LogSpanEvents>,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// How to treat a message whose stored checksum does not match the calculated one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum ChecksumMode {
    /// Do not verify the checksum.
    Ignore,
    /// Log a warning and decode the message anyway.
    Warn,
    /// Reject the message.
    Strict,
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// Default values for configuration.
pub mod defaults {
    use crate::config::{ChecksumMode, LogFormat, LogSpanEvents};

    /// The default value for `link-header-len`, the size of an Ethernet II header.
    pub const DEFAULT_LINK_HEADER_LEN: usize = 14;

    /// The largest accepted `link-header-len`.
    pub const MAX_LINK_HEADER_LEN: usize = 64;

    /// The default value for `checksum`.
    pub const DEFAULT_CHECKSUM_MODE: ChecksumMode = ChecksumMode::Warn;

    /// The default value for `log-format`.
    pub const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Pretty;

    /// The default value for `log-span-events`.
    pub const DEFAULT_LOG_SPAN_EVENTS: LogSpanEvents = LogSpanEvents::Off;

    /// The default value for `log-filter`.
    pub const DEFAULT_LOG_FILTER: &str = "igmp_packet=debug,igmp_dump=debug";
}

/// Fully validated configuration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DumpConfig {
    pub files: Vec<PathBuf>,
    pub link_header_len: usize,
    pub checksum_mode: ChecksumMode,
    pub show_bytes: bool,
    pub detail: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
    pub verbose: bool,
}

impl TryFrom<Args> for DumpConfig {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.files.is_empty() {
            return Err(anyhow!("at least one hex dump file must be given"));
        }
        let link_header_len = args
            .link_header_len
            .unwrap_or(defaults::DEFAULT_LINK_HEADER_LEN);
        if link_header_len > defaults::MAX_LINK_HEADER_LEN {
            return Err(anyhow!(
                "link-header-len ({link_header_len}) must not be greater than {}",
                defaults::MAX_LINK_HEADER_LEN
            ));
        }
        let log_filter = args
            .log_filter
            .unwrap_or_else(|| String::from(defaults::DEFAULT_LOG_FILTER));
        EnvFilter::try_new(&log_filter)
            .map_err(|err| anyhow!("invalid log-filter ({log_filter}): {err}"))?;
        Ok(Self {
            files: args.files,
            link_header_len,
            checksum_mode: args.checksum.unwrap_or(defaults::DEFAULT_CHECKSUM_MODE),
            show_bytes: args.show_bytes,
            detail: args.detail,
            log_format: args.log_format.unwrap_or(defaults::DEFAULT_LOG_FORMAT),
            log_filter,
            log_span_events: args
                .log_span_events
                .unwrap_or(defaults::DEFAULT_LOG_SPAN_EVENTS),
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(cmd: &str) -> anyhow::Result<DumpConfig> {
        let args = Args::try_parse_from(cmd.split_whitespace())?;
        DumpConfig::try_from(args)
    }

    #[test]
    fn test_defaults() {
        let cfg = parse("igmp-dump frame.txt").unwrap();
        assert_eq!(vec![PathBuf::from("frame.txt")], cfg.files);
        assert_eq!(defaults::DEFAULT_LINK_HEADER_LEN, cfg.link_header_len);
        assert_eq!(ChecksumMode::Warn, cfg.checksum_mode);
        assert!(!cfg.show_bytes);
        assert!(!cfg.detail);
        assert_eq!(LogFormat::Pretty, cfg.log_format);
        assert_eq!(defaults::DEFAULT_LOG_FILTER, cfg.log_filter);
        assert_eq!(LogSpanEvents::Off, cfg.log_span_events);
        assert!(!cfg.verbose);
    }

    #[test_case("igmp-dump -c strict a.txt", ChecksumMode::Strict; "short")]
    #[test_case("igmp-dump --checksum ignore a.txt", ChecksumMode::Ignore; "long")]
    fn test_checksum_mode(cmd: &str, expected: ChecksumMode) {
        assert_eq!(expected, parse(cmd).unwrap().checksum_mode);
    }

    #[test]
    fn test_multiple_files_and_flags() {
        let cfg = parse("igmp-dump -l 0 -b -d -v --log-format json a.txt b.txt").unwrap();
        assert_eq!(2, cfg.files.len());
        assert_eq!(0, cfg.link_header_len);
        assert!(cfg.show_bytes);
        assert!(cfg.detail);
        assert!(cfg.verbose);
        assert_eq!(LogFormat::Json, cfg.log_format);
    }

    #[test]
    fn test_link_header_len_too_large() {
        let err = parse("igmp-dump -l 65 a.txt").unwrap_err();
        assert_eq!(
            "link-header-len (65) must not be greater than 64",
            err.to_string()
        );
    }

    #[test]
    fn test_invalid_log_filter() {
        assert!(parse("igmp-dump --log-filter igmp_packet=loud a.txt").is_err());
    }

    #[test]
    fn test_no_files() {
        assert!(parse("igmp-dump").is_err());
    }
}
