//! Sentence decoding on top of `nmea-parser`

use chrono::{Datelike, Timelike};
use nmea_parser::ais::{VesselDynamicData, VesselStaticData};
use nmea_parser::{NmeaParser, ParsedMessage};

use crate::error::DecodeError;
use crate::record::{DecodedPacket, Dimension, Eta, PositionReport, StaticData};

/// AIS messages span at most this many sentences
pub const MAX_FRAGMENTS: u32 = 9;

/// Fragments held for incomplete messages before the buffer is dropped
pub const MAX_BUFFERED_FRAGMENTS: usize = 256;

/// Turns raw sentences into decoded packets.
///
/// Implementations may buffer fragments of multi-sentence messages, so
/// decoding takes `&mut self`.
pub trait SentenceDecoder {
    /// Decode one sentence.
    ///
    /// Returns `Ok(None)` for a fragment that does not yet complete a
    /// message.
    fn decode(&mut self, sentence: &str) -> Result<Option<DecodedPacket>, DecodeError>;
}

/// AIVDM/AIVDO decoder backed by [`NmeaParser`].
///
/// Position reports (types 1, 2, 3, 18, 19, 27) and static data (types 5
/// and 24) are decoded; every other sentence the parser accepts becomes
/// [`DecodedPacket::Other`].
pub struct AisDecoder {
    parser: NmeaParser,
    buffered: usize,
}

impl AisDecoder {
    pub fn new() -> Self {
        AisDecoder {
            parser: NmeaParser::new(),
            buffered: 0,
        }
    }

    /// Fragments waiting for the rest of their message
    pub fn pending(&self) -> usize {
        self.buffered
    }
}

impl Default for AisDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceDecoder for AisDecoder {
    fn decode(&mut self, sentence: &str) -> Result<Option<DecodedPacket>, DecodeError> {
        let count = fragment_count(sentence)?;

        if self.buffered >= MAX_BUFFERED_FRAGMENTS {
            // Starts of messages that never completed
            self.parser = NmeaParser::new();
            self.buffered = 0;
        }

        let message = self
            .parser
            .parse_sentence(sentence)
            .map_err(|e| DecodeError::Rejected(e.to_string()))?;

        let packet = match message {
            ParsedMessage::Incomplete => {
                self.buffered += 1;
                return Ok(None);
            }
            ParsedMessage::VesselDynamicData(data) => {
                DecodedPacket::PositionReport(position_report(data))
            }
            ParsedMessage::VesselStaticData(data) => DecodedPacket::StaticData(static_data(data)),
            _ => DecodedPacket::Other,
        };
        if let Some(count) = count {
            let earlier = (count as usize).saturating_sub(1);
            self.buffered = self.buffered.saturating_sub(earlier);
        }
        Ok(Some(packet))
    }
}

/// Fragment count of an `!xxVDM` / `!xxVDO` sentence, `None` for other
/// sentence kinds
fn fragment_count(sentence: &str) -> Result<Option<u32>, DecodeError> {
    let mut fields = sentence.split(',');
    let is_vdm = fields
        .next()
        .is_some_and(|tag| tag.starts_with('!') && (tag.ends_with("VDM") || tag.ends_with("VDO")));
    if !is_vdm {
        return Ok(None);
    }

    let mut number_field = || fields.next().and_then(|f| f.trim().parse::<u32>().ok());
    let (Some(count), Some(number)) = (number_field(), number_field()) else {
        return Err(DecodeError::Malformed(sentence.to_string()));
    };
    if count == 0 || count > MAX_FRAGMENTS || number == 0 || number > count {
        return Err(DecodeError::InvalidFragment { number, count });
    }
    Ok(Some(count))
}

fn position_report(data: VesselDynamicData) -> PositionReport {
    PositionReport {
        user_id: data.mmsi,
        navigational_status: data.nav_status as u8,
        rate_of_turn: data.rot,
        sog: data.sog_knots,
        position_accuracy: data.high_position_accuracy,
        longitude: data.longitude,
        latitude: data.latitude,
        cog: data.cog,
        true_heading: data.heading_true,
        timestamp: data.timestamp_seconds,
        raim: data.raim_flag,
    }
}

fn static_data(data: VesselStaticData) -> StaticData {
    StaticData {
        user_id: data.mmsi,
        imo_number: data.imo_number,
        call_sign: data.call_sign,
        name: data.name,
        ship_type: data.ship_type as u8,
        dimension: Dimension {
            a: data.dimension_to_bow.unwrap_or(0),
            b: data.dimension_to_stern.unwrap_or(0),
            c: data.dimension_to_port.unwrap_or(0),
            d: data.dimension_to_starboard.unwrap_or(0),
        },
        eta: data.eta.map(|eta| Eta {
            month: eta.month() as u8,
            day: eta.day() as u8,
            hour: eta.hour() as u8,
            minute: eta.minute() as u8,
        }),
        maximum_static_draught: data.draught10.map(|d| f64::from(d) / 10.0),
        destination: data.destination,
    }
}
