//! Wire message types and their fixed byte layout.
//!
//! Both messages are serialised field by field in little-endian order with
//! no implicit padding, so the layout is identical on every platform:
//!
//! ```text
//! ParamsMessage (37 bytes): kp f64 | ki f64 | kd f64 | setpoint f64
//!                           | signal_type u8 | timestamp_ms u32
//! DataMessage   (57 bytes): values [f64; 6] | timestamp_s f64
//!                           | num_values u8
//! ```
//!
//! `signal_type` uses the external encoding `0 = step, 1 = PWM, 2 = sine`.

use serde::{Deserialize, Serialize};

use crate::error::{IpcError, IpcResult};

/// Serialised size of a [`ParamsMessage`].
pub const PARAMS_MESSAGE_SIZE: usize = 37;

/// Serialised size of a [`DataMessage`].
pub const DATA_MESSAGE_SIZE: usize = 57;

/// Number of telemetry slots in a [`DataMessage`].
pub const DATA_VALUE_SLOTS: usize = 6;

/// Controller parameters sent by the GUI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamsMessage {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    /// Reference waveform selector: 0 = step, 1 = PWM, 2 = sine.
    pub signal_type: u8,
    /// Sender timestamp, milliseconds.
    pub timestamp_ms: u32,
}

impl ParamsMessage {
    /// Serialise to the fixed wire layout.
    pub fn to_bytes(&self) -> [u8; PARAMS_MESSAGE_SIZE] {
        let mut buf = [0u8; PARAMS_MESSAGE_SIZE];
        buf[0..8].copy_from_slice(&self.kp.to_le_bytes());
        buf[8..16].copy_from_slice(&self.ki.to_le_bytes());
        buf[16..24].copy_from_slice(&self.kd.to_le_bytes());
        buf[24..32].copy_from_slice(&self.setpoint.to_le_bytes());
        buf[32] = self.signal_type;
        buf[33..37].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        buf
    }

    /// Deserialise from the fixed wire layout.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Malformed`] when `buf` is shorter than the
    /// message layout.
    pub fn from_bytes(buf: &[u8]) -> IpcResult<Self> {
        if buf.len() < PARAMS_MESSAGE_SIZE {
            return Err(IpcError::Malformed {
                what: "parameter message too short",
                got: buf.len(),
            });
        }
        let f64_at = |off: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[off..off + 8]);
            f64::from_le_bytes(b)
        };
        let mut ts = [0u8; 4];
        ts.copy_from_slice(&buf[33..37]);
        Ok(Self {
            kp: f64_at(0),
            ki: f64_at(8),
            kd: f64_at(16),
            setpoint: f64_at(24),
            signal_type: buf[32],
            timestamp_ms: u32::from_le_bytes(ts),
        })
    }
}

/// Telemetry record sent to the GUI.
///
/// `num_values` is 3 in compact mode (`reference, control, plant_output`)
/// or 6 in debug mode (all pipeline signals); remaining slots are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataMessage {
    pub values: [f64; DATA_VALUE_SLOTS],
    /// Seconds since the transmitter started.
    pub timestamp_s: f64,
    /// Number of valid entries in `values` (3 or 6).
    pub num_values: u8,
}

impl DataMessage {
    /// Compact telemetry: reference, control action, plant output.
    pub fn compact(reference: f64, control: f64, plant_output: f64, timestamp_s: f64) -> Self {
        Self {
            values: [reference, control, plant_output, 0.0, 0.0, 0.0],
            timestamp_s,
            num_values: 3,
        }
    }

    /// Debug telemetry: all six pipeline signals.
    pub fn debug(values: [f64; DATA_VALUE_SLOTS], timestamp_s: f64) -> Self {
        Self {
            values,
            timestamp_s,
            num_values: DATA_VALUE_SLOTS as u8,
        }
    }

    /// Serialise to the fixed wire layout.
    pub fn to_bytes(&self) -> [u8; DATA_MESSAGE_SIZE] {
        let mut buf = [0u8; DATA_MESSAGE_SIZE];
        for (i, v) in self.values.iter().enumerate() {
            buf[i * 8..(i + 1) * 8].copy_from_slice(&v.to_le_bytes());
        }
        buf[48..56].copy_from_slice(&self.timestamp_s.to_le_bytes());
        buf[56] = self.num_values;
        buf
    }

    /// Deserialise from the fixed wire layout.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Malformed`] on a short buffer or a `num_values`
    /// other than 3 or 6.
    pub fn from_bytes(buf: &[u8]) -> IpcResult<Self> {
        if buf.len() < DATA_MESSAGE_SIZE {
            return Err(IpcError::Malformed {
                what: "telemetry message too short",
                got: buf.len(),
            });
        }
        let mut values = [0.0; DATA_VALUE_SLOTS];
        for (i, v) in values.iter_mut().enumerate() {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[i * 8..(i + 1) * 8]);
            *v = f64::from_le_bytes(b);
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&buf[48..56]);
        let num_values = buf[56];
        if num_values != 3 && num_values != 6 {
            return Err(IpcError::Malformed {
                what: "telemetry num_values must be 3 or 6",
                got: num_values as usize,
            });
        }
        Ok(Self {
            values,
            timestamp_s: f64::from_le_bytes(ts),
            num_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_round_trip() {
        let msg = ParamsMessage {
            kp: 1.25,
            ki: -0.5,
            kd: 1e-3,
            setpoint: 42.0,
            signal_type: 2,
            timestamp_ms: 123_456,
        };
        let bytes = msg.to_bytes();
        assert_eq!(bytes.len(), PARAMS_MESSAGE_SIZE);
        let back = ParamsMessage::from_bytes(&bytes).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn params_rejects_short_buffer() {
        assert!(ParamsMessage::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn data_round_trip_compact() {
        let msg = DataMessage::compact(1.0, -2.5, 0.75, 12.125);
        let bytes = msg.to_bytes();
        assert_eq!(bytes.len(), DATA_MESSAGE_SIZE);
        let back = DataMessage::from_bytes(&bytes).unwrap();
        assert_eq!(back, msg);
        assert_eq!(back.num_values, 3);
    }

    #[test]
    fn data_round_trip_debug() {
        let msg = DataMessage::debug([1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 0.5);
        let back = DataMessage::from_bytes(&msg.to_bytes()).unwrap();
        assert_eq!(back, msg);
        assert_eq!(back.num_values, 6);
    }

    #[test]
    fn data_rejects_bad_num_values() {
        let mut bytes = DataMessage::compact(0.0, 0.0, 0.0, 0.0).to_bytes();
        bytes[56] = 5;
        assert!(DataMessage::from_bytes(&bytes).is_err());
    }

    #[test]
    fn wire_layout_is_little_endian() {
        let msg = ParamsMessage {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            setpoint: 0.0,
            signal_type: 1,
            timestamp_ms: 0x0102_0304,
        };
        let bytes = msg.to_bytes();
        // 1.0f64 is 0x3FF0000000000000; little-endian puts the exponent last.
        assert_eq!(bytes[7], 0x3F);
        assert_eq!(bytes[6], 0xF0);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[32], 1);
        assert_eq!(&bytes[33..37], &[0x04, 0x03, 0x02, 0x01]);
    }
}
