//! Record types flowing from a recorded log to every consumer.
//!
//! Packet payload structs serialize with PascalCase field names, which is
//! what the browser viewer reads from the playback socket.

use serde::{Deserialize, Serialize};

/// Unique numeric vessel identifier (MMSI)
pub type VesselId = u32;

/// One line of a recorded log file: `{"timestamp":..., "nmea":"..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerRecord {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Raw sentence as received
    #[serde(rename = "nmea")]
    pub raw_sentence: String,
}

/// Position report from a Class A or Class B station.
///
/// Fields the station reports as not available are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionReport {
    #[serde(rename = "UserID")]
    pub user_id: VesselId,
    /// Navigational status code, 15 when not defined
    pub navigational_status: u8,
    /// Degrees per minute, positive to starboard
    pub rate_of_turn: Option<f64>,
    /// Speed over ground in knots
    pub sog: Option<f64>,
    pub position_accuracy: bool,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Course over ground in degrees
    pub cog: Option<f64>,
    pub true_heading: Option<f64>,
    /// UTC second of the report
    pub timestamp: u8,
    pub raim: bool,
}

/// Hull dimensions relative to the position reference point, in metres.
/// Zero means not available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// To bow
    #[serde(rename = "A")]
    pub a: u16,
    /// To stern
    #[serde(rename = "B")]
    pub b: u16,
    /// To port
    #[serde(rename = "C")]
    pub c: u16,
    /// To starboard
    #[serde(rename = "D")]
    pub d: u16,
}

/// Estimated time of arrival (UTC, no year)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Eta {
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

/// Ship static and voyage related data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StaticData {
    #[serde(rename = "UserID")]
    pub user_id: VesselId,
    pub imo_number: Option<u32>,
    pub call_sign: Option<String>,
    pub name: Option<String>,
    /// Ship type category code (20 wing in ground, 30 fishing, 70 cargo, ...)
    #[serde(rename = "Type")]
    pub ship_type: u8,
    pub dimension: Dimension,
    pub eta: Option<Eta>,
    /// Metres
    pub maximum_static_draught: Option<f64>,
    pub destination: Option<String>,
}

/// Result of decoding one complete sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DecodedPacket {
    PositionReport(PositionReport),
    #[serde(rename = "shipStaticData")]
    StaticData(StaticData),
    /// A valid sentence of a kind no consumer interprets
    Other,
}

impl DecodedPacket {
    pub fn vessel_id(&self) -> Option<VesselId> {
        match self {
            DecodedPacket::PositionReport(report) => Some(report.user_id),
            DecodedPacket::StaticData(data) => Some(data.user_id),
            DecodedPacket::Other => None,
        }
    }
}

/// A decoded packet together with the time it was logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(rename = "ais")]
    pub packet: DecodedPacket,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_data(name: &str) -> StaticData {
        StaticData {
            user_id: 5,
            imo_number: Some(9876543),
            call_sign: Some("PD1234".to_string()),
            name: Some(name.to_string()),
            ship_type: 70,
            dimension: Dimension {
                a: 100,
                b: 20,
                c: 5,
                d: 7,
            },
            eta: Some(Eta {
                month: 6,
                day: 15,
                hour: 14,
                minute: 30,
            }),
            maximum_static_draught: Some(8.5),
            destination: Some("ROTTERDAM".to_string()),
        }
    }

    #[test]
    fn test_logger_record_rejects_unknown_fields() {
        let ok: LoggerRecord =
            serde_json::from_str(r#"{"timestamp":1700000000000,"nmea":"!AIVDM"}"#).unwrap();
        assert_eq!(ok.timestamp, 1700000000000);
        assert_eq!(ok.raw_sentence, "!AIVDM");

        let err = serde_json::from_str::<LoggerRecord>(
            r#"{"timestamp":1,"nmea":"!AIVDM","port":"/dev/ttyUSB0"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_packet_is_tagged_by_variant() {
        let record = StructuredRecord {
            timestamp: 42,
            packet: DecodedPacket::StaticData(static_data("ALPHA")),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["ais"]["type"], "shipStaticData");
        assert_eq!(value["ais"]["UserID"], 5);
        assert_eq!(value["ais"]["Type"], 70);
        assert_eq!(value["ais"]["Dimension"]["A"], 100);
        assert_eq!(value["ais"]["Eta"]["Minute"], 30);
    }

    #[test]
    fn test_missing_values_are_null() {
        let packet = DecodedPacket::PositionReport(PositionReport {
            user_id: 9,
            navigational_status: 15,
            ..Default::default()
        });
        let value = serde_json::to_value(&packet).unwrap();
        assert_eq!(value["type"], "positionReport");
        assert!(value["Latitude"].is_null());
        assert!(value["TrueHeading"].is_null());
    }

    #[test]
    fn test_structured_record_reads_back() {
        let record = StructuredRecord {
            timestamp: 7,
            packet: DecodedPacket::Other,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"timestamp":7,"ais":{"type":"other"}}"#);
        let back: StructuredRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.packet.vessel_id(), None);
    }
}
