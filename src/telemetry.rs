// gSENSOR - Telemetry payloads
//
// Wireless notification layout, version 1, all fields little-endian:
//
//   update (21 bytes): version u8 | timestamp_ms u32 | x f32 | y f32 | z f32 | magnitude f32
//   peak   (9 bytes):  version u8 | timestamp_ms u32 | peak f32
//
// Debug stream lines are CSV: `timestamp,x,y,z,magnitude,peak`, three decimals.

use crate::events::Sample;

pub const PAYLOAD_VERSION: u8 = 1;
pub const UPDATE_LEN: usize = 21;
pub const PEAK_LEN: usize = 9;

pub fn pack_update(timestamp_ms: u32, filtered: Sample, magnitude: f32) -> [u8; UPDATE_LEN] {
    let mut buf = [0u8; UPDATE_LEN];
    buf[0] = PAYLOAD_VERSION;
    buf[1..5].copy_from_slice(&timestamp_ms.to_le_bytes());
    for (i, v) in [filtered.x, filtered.y, filtered.z, magnitude].into_iter().enumerate() {
        let at = 5 + i * 4;
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
    buf
}

pub fn pack_peak(timestamp_ms: u32, peak: f32) -> [u8; PEAK_LEN] {
    let mut buf = [0u8; PEAK_LEN];
    buf[0] = PAYLOAD_VERSION;
    buf[1..5].copy_from_slice(&timestamp_ms.to_le_bytes());
    buf[5..9].copy_from_slice(&peak.to_le_bytes());
    buf
}

pub fn csv_line(timestamp_ms: u32, filtered: Sample, magnitude: f32, peak: f32) -> String {
    format!(
        "{},{:.3},{:.3},{:.3},{:.3},{:.3}",
        timestamp_ms, filtered.x, filtered.y, filtered.z, magnitude, peak
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_at(buf: &[u8], at: usize) -> f32 {
        f32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn update_layout() {
        let buf = pack_update(0x0102_0304, Sample::new(1.5, -2.0, 9.81), 10.0);
        assert_eq!(buf.len(), UPDATE_LEN);
        assert_eq!(buf[0], PAYLOAD_VERSION);
        assert_eq!(&buf[1..5], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(f32_at(&buf, 5), 1.5);
        assert_eq!(f32_at(&buf, 9), -2.0);
        assert_eq!(f32_at(&buf, 13), 9.81);
        assert_eq!(f32_at(&buf, 17), 10.0);
    }

    #[test]
    fn peak_layout() {
        let buf = pack_peak(500, 42.25);
        assert_eq!(buf[0], PAYLOAD_VERSION);
        assert_eq!(u32::from_le_bytes(buf[1..5].try_into().unwrap()), 500);
        assert_eq!(f32_at(&buf, 5), 42.25);
    }

    #[test]
    fn csv_has_three_decimals() {
        let line = csv_line(1234, Sample::new(0.0, -0.5, 1.0), 1.118, 5.9);
        assert_eq!(line, "1234,0.000,-0.500,1.000,1.118,5.900");
    }
}
