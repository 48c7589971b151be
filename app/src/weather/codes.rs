//! Lookup tables for the remote API's coded weather strings.
//!
//! A coded string is a comma separated list of `coverage:intensity:condition` triples, e.g.
//! `"S:L:RW,C:H:T"`. Only the first triple is used. Codes missing from a table decode to that
//! table's fallback value instead of failing.

use derive_more::derive::Display;

pub const COVERAGE_FALLBACK: u8 = 16;
pub const INTENSITY_FALLBACK: u8 = 0;
pub const CONDITION_FALLBACK: u8 = 22;

/// Selects which table a channel is decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Decoder {
    Coverage,
    Intensity,
    Condition,
}

impl Decoder {
    fn position(&self) -> usize {
        match self {
            Decoder::Coverage => 0,
            Decoder::Intensity => 1,
            Decoder::Condition => 2,
        }
    }

    /// Decodes the relevant position of the first triple of a coded weather string.
    pub fn decode(&self, coded: &str) -> u8 {
        let code = coded
            .split(',')
            .next()
            .and_then(|triple| triple.split(':').nth(self.position()))
            .unwrap_or("");

        match self {
            Decoder::Coverage => coverage_code(code),
            Decoder::Intensity => intensity_code(code),
            Decoder::Condition => condition_code(code),
        }
    }
}

pub fn coverage_code(code: &str) -> u8 {
    match code {
        "AR" => 0,  // areas of
        "BR" => 1,  // brief
        "C" => 2,   // chance of
        "D" => 3,   // definite
        "FQ" => 4,  // frequent
        "IN" => 5,  // intermittent
        "IS" => 6,  // isolated
        "L" => 7,   // likely
        "NM" => 8,  // numerous
        "O" => 9,   // occasional
        "PA" => 10, // patchy
        "PD" => 11, // periods of
        "S" => 12,  // slight chance
        "SC" => 13, // scattered
        "VC" => 14, // in the vicinity
        "WD" => 15, // widespread
        _ => COVERAGE_FALLBACK,
    }
}

pub fn intensity_code(code: &str) -> u8 {
    match code {
        "VL" => 1,
        "L" => 2,
        "H" => 3,
        "VH" => 4,
        _ => INTENSITY_FALLBACK,
    }
}

pub fn condition_code(code: &str) -> u8 {
    match code {
        "A" => 0,   // hail
        "BD" => 1,  // blowing dust
        "BN" => 2,  // blowing sand
        "BR" => 3,  // mist
        "BS" => 4,  // blowing snow
        "BY" => 5,  // blowing spray
        "F" => 6,   // fog
        "FR" => 7,  // frost
        "H" => 8,   // haze
        "IC" => 9,  // ice crystals
        "IF" => 10, // ice fog
        "IP" => 11, // sleet
        "K" => 12,  // smoke
        "L" => 13,  // drizzle
        "R" => 14,  // rain
        "RW" => 15, // rain showers
        "RS" => 16, // rain/snow mix
        "SI" => 17, // snow/sleet mix
        "WM" => 18, // wintry mix
        "S" => 19,  // snow
        "SW" => 20, // snow showers
        "T" => 21,  // thunderstorms
        "UP" => CONDITION_FALLBACK,
        "VA" => 23, // volcanic ash
        "WP" => 24, // waterspouts
        "ZF" => 25, // freezing fog
        "ZL" => 26, // freezing drizzle
        "ZR" => 27, // freezing rain
        "ZY" => 28, // freezing spray
        "CL" => 29, // clear
        "FW" => 30, // fair
        "SC" => 31, // partly cloudy
        "BK" => 32, // mostly cloudy
        "OV" => 33, // cloudy
        _ => CONDITION_FALLBACK,
    }
}
