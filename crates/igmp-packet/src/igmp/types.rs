use crate::error::{Error, Result};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// The type of an `IGMP` message.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum IgmpType {
    /// Membership Query, shared by `IGMPv1`, `IGMPv2` and `IGMPv3`.
    MembershipQuery,
    /// `IGMPv1` Membership Report.
    V1MembershipReport,
    /// `IGMPv2` Membership Report.
    V2MembershipReport,
    /// `IGMPv3` Membership Report.
    V3MembershipReport,
    /// Leave Group, defined by `IGMPv2` and also used by `IGMPv3` hosts.
    LeaveGroup,
}

impl IgmpType {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::MembershipQuery => 0x11,
            Self::V1MembershipReport => 0x12,
            Self::V2MembershipReport => 0x16,
            Self::V3MembershipReport => 0x22,
            Self::LeaveGroup => 0x17,
        }
    }
}

impl TryFrom<u8> for IgmpType {
    type Error = Error;

    fn try_from(val: u8) -> Result<Self> {
        match val {
            0x11 => Ok(Self::MembershipQuery),
            0x12 => Ok(Self::V1MembershipReport),
            0x16 => Ok(Self::V2MembershipReport),
            0x22 => Ok(Self::V3MembershipReport),
            0x17 => Ok(Self::LeaveGroup),
            id => Err(Error::UnknownEnumValue("IgmpType", id)),
        }
    }
}

impl Display for IgmpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MembershipQuery => write!(f, "membership query"),
            Self::V1MembershipReport => write!(f, "v1 membership report"),
            Self::V2MembershipReport => write!(f, "v2 membership report"),
            Self::V3MembershipReport => write!(f, "v3 membership report"),
            Self::LeaveGroup => write!(f, "leave group"),
        }
    }
}

/// The type of an `IGMPv3` group record (RFC 3376 section 4.2.12).
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum RecordType {
    /// The interface has a filter mode of INCLUDE for the multicast address.
    ModeIsInclude,
    /// The interface has a filter mode of EXCLUDE for the multicast address.
    ModeIsExclude,
    /// The interface has changed to INCLUDE filter mode.
    ChangeToIncludeMode,
    /// The interface has changed to EXCLUDE filter mode.
    ChangeToExcludeMode,
    /// The sources are additional sources the system wishes to hear from.
    AllowNewSources,
    /// The sources are sources the system no longer wishes to hear from.
    BlockOldSources,
}

impl RecordType {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::ModeIsInclude => 1,
            Self::ModeIsExclude => 2,
            Self::ChangeToIncludeMode => 3,
            Self::ChangeToExcludeMode => 4,
            Self::AllowNewSources => 5,
            Self::BlockOldSources => 6,
        }
    }
}

impl TryFrom<u8> for RecordType {
    type Error = Error;

    fn try_from(val: u8) -> Result<Self> {
        match val {
            1 => Ok(Self::ModeIsInclude),
            2 => Ok(Self::ModeIsExclude),
            3 => Ok(Self::ChangeToIncludeMode),
            4 => Ok(Self::ChangeToExcludeMode),
            5 => Ok(Self::AllowNewSources),
            6 => Ok(Self::BlockOldSources),
            id => Err(Error::UnknownEnumValue("RecordType", id)),
        }
    }
}

/// The mantissa/exponent encoding shared by the `IGMPv3` Max Resp Code and QQIC fields.
///
/// Codes below 128 are the value itself. Otherwise the byte is laid out as:
///
/// ```text
///  0 1 2 3 4 5 6 7
/// +-+-+-+-+-+-+-+-+
/// |1| exp | mant  |
/// +-+-+-+-+-+-+-+-+
/// ```
///
/// and the value is `(mant | 0x10) << (exp + 3)`.
pub mod mant_exp {
    use crate::error::{Error, Result};

    /// The largest code which is interpreted linearly.
    pub const MAX_UNSCALED_CODE: u8 = 127;

    /// The largest permitted mantissa.
    pub const MAX_MANT: u8 = 15;

    /// The largest permitted exponent.
    pub const MAX_EXP: u8 = 7;

    /// Decode a code into its unit-less value.
    #[must_use]
    pub const fn decode(code: u8) -> u32 {
        if code <= MAX_UNSCALED_CODE {
            return code as u32;
        }
        let mant = (code & 0x0f) as u32;
        let exp = ((code & 0x70) >> 4) as u32;
        (mant | 0x10) << (exp + 3)
    }

    /// Encode a mantissa and exponent into the exponential form of the code.
    pub fn encode(mant: u8, exp: u8) -> Result<u8> {
        if mant > MAX_MANT {
            return Err(Error::RangeError(format!(
                "mant must be in the interval [0, {MAX_MANT}]: {mant}"
            )));
        }
        if exp > MAX_EXP {
            return Err(Error::RangeError(format!(
                "exp must be in the interval [0, {MAX_EXP}]: {exp}"
            )));
        }
        Ok(0x80 | (exp << 4) | mant)
    }
}

const NANOS_PER_TENTH: u32 = 100_000_000;

/// The number of whole tenths of a second in `duration`, if it has no finer precision.
fn whole_tenths(duration: Duration) -> Option<u64> {
    let nanos = duration.subsec_nanos();
    (nanos % NANOS_PER_TENTH == 0)
        .then(|| duration.as_secs().saturating_mul(10) + u64::from(nanos / NANOS_PER_TENTH))
}

/// The number of whole seconds in `duration`, if it has no finer precision.
fn whole_seconds(duration: Duration) -> Option<u64> {
    (duration.subsec_nanos() == 0).then(|| duration.as_secs())
}

fn tenths_to_duration(tenths: u32) -> Duration {
    Duration::from_millis(u64::from(tenths) * 100)
}

/// The `IGMPv3` Max Resp Code, a mantissa/exponent code in units of 1/10 second.
///
/// A code of zero cannot be constructed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MaxResponseCode(u8);

impl MaxResponseCode {
    /// The largest duration which can be encoded without an exponent.
    pub const MAX_LINEAR: Duration = Duration::from_millis(12_700);

    /// Create from the raw code.
    pub fn new(code: u8) -> Result<Self> {
        if code == 0 {
            Err(Error::RangeError(String::from(
                "max response code cannot be 0, allowed interval: (0, 12.7] seconds",
            )))
        } else {
            Ok(Self(code))
        }
    }

    /// Create from a mantissa and exponent.
    pub fn from_mant_exp(mant: u8, exp: u8) -> Result<Self> {
        mant_exp::encode(mant, exp).map(Self)
    }

    /// Create the linear code for `duration`.
    ///
    /// The duration must be a whole number of tenths of a second in the interval (0, 12.7] seconds.
    pub fn from_duration(duration: Duration) -> Result<Self> {
        let tenths = whole_tenths(duration).ok_or_else(|| {
            Error::RangeError(format!(
                "max response time must have at most tenths of a second precision: {duration:?}"
            ))
        })?;
        match u8::try_from(tenths) {
            Ok(code @ 1..=mant_exp::MAX_UNSCALED_CODE) => Ok(Self(code)),
            _ => Err(Error::RangeError(format!(
                "max response time must be in the interval (0, 12.7] seconds: {duration:?}"
            ))),
        }
    }

    /// A code as read from the wire, which may be zero.
    pub(crate) const fn from_wire(code: u8) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// The decoded value in tenths of a second.
    #[must_use]
    pub const fn tenths(self) -> u32 {
        mant_exp::decode(self.0)
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        tenths_to_duration(self.tenths())
    }
}

/// The `IGMPv3` Querier's Query Interval Code, a mantissa/exponent code in units of seconds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct QueryIntervalCode(u8);

impl QueryIntervalCode {
    /// Create from the raw code, every code is valid.
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Create from a mantissa and exponent.
    pub fn from_mant_exp(mant: u8, exp: u8) -> Result<Self> {
        mant_exp::encode(mant, exp).map(Self)
    }

    /// Create the linear code for `duration`.
    ///
    /// The duration must be a whole number of seconds in the interval [0, 127].
    pub fn from_duration(duration: Duration) -> Result<Self> {
        let seconds = whole_seconds(duration).ok_or_else(|| {
            Error::RangeError(format!(
                "query interval must be a whole number of seconds: {duration:?}"
            ))
        })?;
        match u8::try_from(seconds) {
            Ok(code @ 0..=mant_exp::MAX_UNSCALED_CODE) => Ok(Self(code)),
            _ => Err(Error::RangeError(format!(
                "query interval must be in the interval [0, 127] seconds: {duration:?}"
            ))),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// The decoded value in seconds.
    #[must_use]
    pub const fn seconds(self) -> u32 {
        mant_exp::decode(self.0)
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::from_secs(u64::from(self.seconds()))
    }
}

/// The `IGMPv2` Max Response Time in units of 1/10 second.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ResponseTime(u8);

impl ResponseTime {
    /// A response time of zero, as carried by reports and leave group messages.
    pub const ZERO: Self = Self(0);

    /// The largest representable response time.
    pub const MAX: Duration = Duration::from_millis(25_500);

    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Create from `duration`, which must be a whole number of tenths of a second in the interval
    /// [0, 25.5] seconds.
    pub fn from_duration(duration: Duration) -> Result<Self> {
        let tenths = whole_tenths(duration).ok_or_else(|| {
            Error::RangeError(format!(
                "response time must have at most tenths of a second precision: {duration:?}"
            ))
        })?;
        u8::try_from(tenths).map(Self).map_err(|_| {
            Error::RangeError(format!(
                "response time must be in the interval [0, 25.5] seconds: {duration:?}"
            ))
        })
    }

    /// The raw value in tenths of a second.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        tenths_to_duration(u32::from(self.0))
    }
}

impl Default for ResponseTime {
    fn default() -> Self {
        Self::ZERO
    }
}

/// The `IGMPv3` Querier's Robustness Variable, a 3-bit value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RobustnessVariable(u8);

impl RobustnessVariable {
    /// The largest value which fits in the QRV field.
    pub const MAX: u8 = 7;

    /// The default Robustness Variable (RFC 3376 section 8.1).
    pub const DEFAULT: Self = Self(2);

    pub fn new(value: u8) -> Result<Self> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(Error::RangeError(format!(
                "robustness variable must be in the interval [0, {}]: {value}",
                Self::MAX
            )))
        }
    }

    pub(crate) const fn from_wire(value: u8) -> Self {
        Self(value & Self::MAX)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for RobustnessVariable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A 32-bit word of `IGMPv3` group record auxiliary data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AuxiliaryWord([u8; 4]);

impl AuxiliaryWord {
    /// The size of a word in bytes.
    pub const SIZE: usize = 4;

    /// Create a word from exactly 4 bytes.
    pub fn new(bytes: &[u8]) -> Result<Self> {
        <[u8; Self::SIZE]>::try_from(bytes).map(Self).map_err(|_| {
            Error::RangeError(format!(
                "auxiliary word must contain exactly 4 bytes: {}",
                bytes.len()
            ))
        })
    }

    /// Split a run of bytes into words.
    pub fn from_bytes(bytes: &[u8]) -> Result<Vec<Self>> {
        if bytes.len() % Self::SIZE != 0 {
            return Err(Error::RangeError(format!(
                "auxiliary data length must be a multiple of 4: {}",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(Self::SIZE)
            .map(|word| Self([word[0], word[1], word[2], word[3]]))
            .collect())
    }

    #[must_use]
    pub const fn bytes(self) -> [u8; 4] {
        self.0
    }
}

impl From<[u8; 4]> for AuxiliaryWord {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}
