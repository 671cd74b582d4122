//! Wire format for the Progressor data and control points.
//!
//! Notifications are `[kind, len, payload...]` with little-endian fields and
//! no escaping or checksum. Commands are a single opcode byte optionally
//! followed by payload bytes.

use crate::error::CodecError;

/// Progressor GATT service.
pub const SERVICE_UUID: &str = "7e4e1701-1ea6-40c9-9dcc-13d34ffead57";
/// Notify-only data point.
pub const DATA_POINT_UUID: &str = "7e4e1702-1ea6-40c9-9dcc-13d34ffead57";
/// Write-only control point.
pub const CONTROL_POINT_UUID: &str = "7e4e1703-1ea6-40c9-9dcc-13d34ffead57";
/// Largest attribute value either characteristic carries.
pub const MAX_ATTR_LEN: usize = 20;

pub const WEIGHT_FRAME_LEN: usize = 10;
pub const BATTERY_FRAME_LEN: usize = 6;
pub const DEVICE_INFO_FRAME_LEN: usize = 20;
/// Bytes reserved for the NUL-padded name inside a device-info payload.
pub const NAME_FIELD_LEN: usize = 16;

/// Response kind tag (byte 0 of every notification).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseKind {
    Battery = 0x00,
    Weight = 0x01,
    DeviceInfo = 0x02,
}

impl ResponseKind {
    /// Payload length carried in byte 1.
    pub const fn payload_len(self) -> usize {
        match self {
            ResponseKind::Battery => BATTERY_FRAME_LEN - 2,
            ResponseKind::Weight => WEIGHT_FRAME_LEN - 2,
            ResponseKind::DeviceInfo => DEVICE_INFO_FRAME_LEN - 2,
        }
    }
}

impl TryFrom<u8> for ResponseKind {
    type Error = CodecError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x00 => Ok(ResponseKind::Battery),
            0x01 => Ok(ResponseKind::Weight),
            0x02 => Ok(ResponseKind::DeviceInfo),
            other => Err(CodecError::UnknownKind(other)),
        }
    }
}

/// Control-point opcodes understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Tare = 0x64,
    StartMeasurement = 0x65,
    StopMeasurement = 0x66,
    Shutdown = 0x6E,
    SampleBattery = 0x6F,
    GetDeviceInfo = 0x70,
}

impl TryFrom<u8> for Opcode {
    /// The unrecognized byte is handed back.
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x64 => Ok(Opcode::Tare),
            0x65 => Ok(Opcode::StartMeasurement),
            0x66 => Ok(Opcode::StopMeasurement),
            0x6E => Ok(Opcode::Shutdown),
            0x6F => Ok(Opcode::SampleBattery),
            0x70 => Ok(Opcode::GetDeviceInfo),
            other => Err(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

/// One inbound control-point write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl CommandFrame {
    pub fn new(opcode: u8) -> Self {
        Self {
            opcode,
            payload: Vec::new(),
        }
    }

    pub fn known_opcode(&self) -> Option<Opcode> {
        Opcode::try_from(self.opcode).ok()
    }
}

/// An encoded notification ready for a single send.
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    kind: ResponseKind,
    buf: [u8; MAX_ATTR_LEN],
    len: usize,
}

impl ResponseFrame {
    fn from_slice(kind: ResponseKind, bytes: &[u8]) -> Self {
        let mut buf = [0u8; MAX_ATTR_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self {
            kind,
            buf,
            len: bytes.len(),
        }
    }

    pub fn weight(weight_kg: f32, timestamp_us: u32) -> Self {
        Self::from_slice(
            ResponseKind::Weight,
            &encode_weight_sample(weight_kg, timestamp_us),
        )
    }

    pub fn battery(millivolts: u32) -> Self {
        Self::from_slice(ResponseKind::Battery, &encode_battery_level(millivolts))
    }

    pub fn device_info(name: &str, version_major: u8, version_minor: u8) -> Self {
        Self::from_slice(
            ResponseKind::DeviceInfo,
            &encode_device_info(name, version_major, version_minor),
        )
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl core::fmt::Debug for ResponseFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponseFrame")
            .field("kind", &self.kind)
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

pub fn encode_weight_sample(weight_kg: f32, timestamp_us: u32) -> [u8; WEIGHT_FRAME_LEN] {
    let mut out = [0u8; WEIGHT_FRAME_LEN];
    out[0] = ResponseKind::Weight as u8;
    out[1] = ResponseKind::Weight.payload_len() as u8;
    out[2..6].copy_from_slice(&weight_kg.to_bits().to_le_bytes());
    out[6..10].copy_from_slice(&timestamp_us.to_le_bytes());
    out
}

pub fn encode_battery_level(millivolts: u32) -> [u8; BATTERY_FRAME_LEN] {
    let mut out = [0u8; BATTERY_FRAME_LEN];
    out[0] = ResponseKind::Battery as u8;
    out[1] = ResponseKind::Battery.payload_len() as u8;
    out[2..6].copy_from_slice(&millivolts.to_le_bytes());
    out
}

/// Name is cut to at most 15 bytes on a UTF-8 boundary; byte 15 of the field is always NUL.
pub fn encode_device_info(
    name: &str,
    version_major: u8,
    version_minor: u8,
) -> [u8; DEVICE_INFO_FRAME_LEN] {
    let mut out = [0u8; DEVICE_INFO_FRAME_LEN];
    out[0] = ResponseKind::DeviceInfo as u8;
    out[1] = ResponseKind::DeviceInfo.payload_len() as u8;
    let name = truncate_name(name);
    out[2..2 + name.len()].copy_from_slice(name.as_bytes());
    out[2 + NAME_FIELD_LEN] = version_minor;
    out[3 + NAME_FIELD_LEN] = version_major;
    out
}

/// Longest prefix of `name` that fits the name field with its terminator.
pub fn truncate_name(name: &str) -> &str {
    let max = NAME_FIELD_LEN - 1;
    if name.len() <= max {
        return name;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

pub fn decode_command(bytes: &[u8]) -> Result<CommandFrame, CodecError> {
    let (&opcode, payload) = bytes.split_first().ok_or(CodecError::MalformedFrame)?;
    Ok(CommandFrame {
        opcode,
        payload: payload.to_vec(),
    })
}

// ── Central-side decoding ────────────────────────────────────────────────────

/// A notification as the central sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Battery { millivolts: u32 },
    Weight { kg: f32, timestamp_us: u32 },
    DeviceInfo { name: String, major: u8, minor: u8 },
}

pub fn decode_response(bytes: &[u8]) -> Result<Response, CodecError> {
    if bytes.len() < 2 {
        return Err(CodecError::Truncated {
            expected: 2,
            got: bytes.len(),
        });
    }
    let kind = ResponseKind::try_from(bytes[0])?;
    let declared = usize::from(bytes[1]);
    let expected = kind.payload_len();
    if declared != expected {
        return Err(CodecError::LengthMismatch {
            kind: bytes[0],
            declared,
            expected,
        });
    }
    if bytes.len() < 2 + expected {
        return Err(CodecError::Truncated {
            expected: 2 + expected,
            got: bytes.len(),
        });
    }
    let p = &bytes[2..2 + expected];
    Ok(match kind {
        ResponseKind::Battery => Response::Battery {
            millivolts: le_u32(&p[0..4]),
        },
        ResponseKind::Weight => Response::Weight {
            kg: f32::from_bits(le_u32(&p[0..4])),
            timestamp_us: le_u32(&p[4..8]),
        },
        ResponseKind::DeviceInfo => {
            let field = &p[..NAME_FIELD_LEN];
            let end = field.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD_LEN);
            Response::DeviceInfo {
                name: String::from_utf8_lossy(&field[..end]).into_owned(),
                minor: p[NAME_FIELD_LEN],
                major: p[NAME_FIELD_LEN + 1],
            }
        }
    })
}

#[inline]
fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_layout_matches_wire() {
        let f = encode_weight_sample(25.5, 0x0403_0201);
        assert_eq!(f[0], 0x01);
        assert_eq!(f[1], 0x08);
        assert_eq!(&f[2..6], &25.5f32.to_le_bytes());
        assert_eq!(&f[6..10], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn battery_layout_matches_wire() {
        assert_eq!(encode_battery_level(3700), [0x00, 0x04, 0x74, 0x0E, 0x00, 0x00]);
    }

    #[test]
    fn device_info_layout() {
        let f = encode_device_info("Progressor", 1, 2);
        assert_eq!(f.len(), 20);
        assert_eq!(f[0], 0x02);
        assert_eq!(f[1], 18);
        assert_eq!(&f[2..12], b"Progressor");
        assert!(f[12..18].iter().all(|&b| b == 0));
        assert_eq!(f[18], 2, "minor first");
        assert_eq!(f[19], 1, "then major");
    }

    #[test]
    fn long_name_is_truncated_and_terminated() {
        let f = encode_device_info("ABCDEFGHIJKLMNOPQRSTUVWXYZ", 3, 4);
        assert_eq!(&f[2..17], b"ABCDEFGHIJKLMNO");
        assert_eq!(f[17], 0);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 14 ASCII bytes + a 2-byte char would straddle the 15-byte limit.
        let name = "abcdefghijklmnö";
        assert_eq!(truncate_name(name), "abcdefghijklmn");
        assert!(truncate_name(name).len() <= 15);
    }

    #[test]
    fn empty_command_is_malformed() {
        assert!(matches!(decode_command(&[]), Err(CodecError::MalformedFrame)));
    }

    #[test]
    fn command_keeps_payload() {
        let c = decode_command(&[0x65, 0xAA, 0xBB]).unwrap();
        assert_eq!(c.opcode, 0x65);
        assert_eq!(c.payload, vec![0xAA, 0xBB]);
        assert_eq!(c.known_opcode(), Some(Opcode::StartMeasurement));
        assert_eq!(decode_command(&[0x42]).unwrap().known_opcode(), None);
    }

    #[test]
    fn decode_rejects_bad_frames() {
        assert!(matches!(
            decode_response(&[0x01]),
            Err(CodecError::Truncated { .. })
        ));
        assert!(matches!(
            decode_response(&[0x09, 0x04, 0, 0, 0, 0]),
            Err(CodecError::UnknownKind(0x09))
        ));
        assert!(matches!(
            decode_response(&[0x00, 0x05, 0, 0, 0, 0, 0]),
            Err(CodecError::LengthMismatch { .. })
        ));
        assert!(matches!(
            decode_response(&[0x01, 0x08, 0, 0]),
            Err(CodecError::Truncated { expected: 10, got: 4 })
        ));
    }

    #[test]
    fn response_frame_wraps_encoders() {
        let r = ResponseFrame::battery(3700);
        assert_eq!(r.kind(), ResponseKind::Battery);
        assert_eq!(r.as_bytes(), &encode_battery_level(3700));
        let d = ResponseFrame::device_info("P", 1, 0);
        assert_eq!(d.as_bytes().len(), DEVICE_INFO_FRAME_LEN);
    }
}
