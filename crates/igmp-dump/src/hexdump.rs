//! Parse the text hex dump format produced by Wireshark's "Copy as Hex Dump".
//!
//! ```text
//! 0000   01 00 5e 00 00 fc 00 1b 21 3a 4b 5c 08 00 45 c0   ..^.....!:K\..E.
//! 0010   00 1c 00 00 40 00 01 02 d6 71 c0 a8 01 0a e0 00   ....@....q......
//! ```
//!
//! Each line holds a hexadecimal offset, up to 16 octets and an optional ASCII rendering. The
//! number of octets on a line is taken from the offset of the line which follows it, so ASCII text
//! which happens to look like an octet is never consumed. Blank lines are ignored.
use thiserror::Error;

const MAX_OCTETS_PER_LINE: usize = 16;

/// A hex dump parse error, lines are numbered from 1.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum HexDumpError {
    #[error("line {0}: invalid offset: {1}")]
    InvalidOffset(usize, String),
    #[error("line {0}: expected offset {1:#06x}, found {2:#06x}")]
    UnexpectedOffset(usize, usize, usize),
    #[error("line {0}: expected {1} octets, found {2}")]
    MissingOctets(usize, usize, usize),
    #[error("no octets found")]
    Empty,
}

struct Line {
    number: usize,
    offset: usize,
    octets: Vec<u8>,
}

/// Parse a hex dump into the bytes it describes.
pub fn parse(text: &str) -> Result<Vec<u8>, HexDumpError> {
    let lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(i + 1, line))
        .collect::<Result<Vec<_>, _>>()?;
    let mut bytes = Vec::new();
    let mut lines = lines.iter().peekable();
    while let Some(line) = lines.next() {
        if line.offset != bytes.len() {
            return Err(HexDumpError::UnexpectedOffset(
                line.number,
                bytes.len(),
                line.offset,
            ));
        }
        let count = match lines.peek() {
            Some(next) if next.offset > line.offset => next.offset - line.offset,
            Some(next) => {
                return Err(HexDumpError::UnexpectedOffset(
                    next.number,
                    line.offset + line.octets.len(),
                    next.offset,
                ))
            }
            None => line.octets.len(),
        };
        if count > line.octets.len() {
            return Err(HexDumpError::MissingOctets(
                line.number,
                count,
                line.octets.len(),
            ));
        }
        bytes.extend_from_slice(&line.octets[..count]);
    }
    if bytes.is_empty() {
        Err(HexDumpError::Empty)
    } else {
        Ok(bytes)
    }
}

fn parse_line(number: usize, line: &str) -> Result<Line, HexDumpError> {
    let mut tokens = line.split_whitespace();
    let offset_token = tokens.next().unwrap_or_default();
    let offset = usize::from_str_radix(offset_token.trim_end_matches(':'), 16)
        .map_err(|_| HexDumpError::InvalidOffset(number, String::from(offset_token)))?;
    let octets = tokens
        .take(MAX_OCTETS_PER_LINE)
        .map_while(parse_octet)
        .collect();
    Ok(Line {
        number,
        offset,
        octets,
    })
}

/// Exactly two hex digits, no sign.
fn parse_octet(token: &str) -> Option<u8> {
    if token.len() == 2 && token.bytes().all(|b| b.is_ascii_hexdigit()) {
        u8::from_str_radix(token, 16).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_parse_fixture() {
        let expected = hex!(
            "
            01 00 5e 00 00 fc 00 1b 21 3a 4b 5c 08 00 45 c0
            00 1c 00 00 40 00 01 02 d6 71 c0 a8 01 0a e0 00
            00 fc 12 00 0d 03 e0 00 00 fc 00 00 00 00 00 00
            00 00 00 00 00 00 00 00 00 00 00 00
            "
        );
        let bytes = parse(include_str!("../fixtures/igmpv1_membership_report.txt")).unwrap();
        assert_eq!(expected.as_slice(), bytes);
    }

    #[test]
    fn test_signed_token_is_not_an_octet() {
        let bytes = parse("0000   11 64 +f ee\n").unwrap();
        assert_eq!(vec![0x11, 0x64], bytes);
    }

    #[test]
    fn test_parse_partial_last_line() {
        let bytes = parse(include_str!("../fixtures/igmpv3_membership_report.txt")).unwrap();
        assert_eq!(82, bytes.len());
        assert_eq!([0x1e, 0x28], bytes[80..]);
    }

    #[test]
    fn test_ascii_column_is_not_octets() {
        let text = "0000   41 42 43 44 45 46 47 48 49 4a 4b 4c 4d 4e 4f 50   ab cd ef\n\
                    0010   de ad                                             ..\n";
        let bytes = parse(text).unwrap();
        assert_eq!(18, bytes.len());
        assert_eq!([0xde, 0xad], bytes[16..]);
    }

    #[test]
    fn test_uppercase_and_colon_offsets() {
        let bytes = parse("00000000: DE AD BE EF\n").unwrap();
        assert_eq!(vec![0xde, 0xad, 0xbe, 0xef], bytes);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let bytes = parse("\n0000   11 64\n\n0002   ee 9b\n\n").unwrap();
        assert_eq!(vec![0x11, 0x64, 0xee, 0x9b], bytes);
    }

    #[test]
    fn test_invalid_offset() {
        assert_eq!(
            Err(HexDumpError::InvalidOffset(1, String::from("frame"))),
            parse("frame 1 of 3\n")
        );
    }

    #[test]
    fn test_first_offset_not_zero() {
        assert_eq!(
            Err(HexDumpError::UnexpectedOffset(1, 0, 0x10)),
            parse("0010   11 64\n")
        );
    }

    #[test]
    fn test_offset_goes_backwards() {
        assert_eq!(
            Err(HexDumpError::UnexpectedOffset(2, 2, 0)),
            parse("0000   11 64\n0000   00 00\n")
        );
    }

    #[test]
    fn test_missing_octets() {
        assert_eq!(
            Err(HexDumpError::MissingOctets(1, 4, 2)),
            parse("0000   11 64\n0004   00 00\n")
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(Err(HexDumpError::Empty), parse(""));
        assert_eq!(Err(HexDumpError::Empty), parse("0000\n"));
    }
}
