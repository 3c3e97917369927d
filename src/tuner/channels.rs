//! Static channel table
//!
//! Bidirectional mapping between the tuner's channel register (0x01) values
//! and frequencies, covering the 48 channels of the six 5.8GHz FPV bands.
//!
//! Lookups are exact matches only. A handful of register values collide
//! across bands (e.g. 0x2A05 is both Band A channel 1 and Band B channel 8);
//! the first entry in table order wins, so the table order is significant
//! and must not be re-sorted.

/// 5.8GHz FPV band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Raceband,
    A,
    B,
    E,
    /// Band F, also known as Airwave
    F,
    /// Band D, also known as 5.3
    D,
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Band::Raceband => write!(f, "Raceband"),
            Band::A => write!(f, "Band A"),
            Band::B => write!(f, "Band B"),
            Band::E => write!(f, "Band E"),
            Band::F => write!(f, "Band F / Airwave"),
            Band::D => write!(f, "Band D / 5.3"),
        }
    }
}

/// One channel in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    /// Band this channel belongs to
    pub band: Band,
    /// Channel number within the band (1-8)
    pub channel: u8,
    /// Value of register 0x01 when tuned to this channel
    pub register: u32,
    /// Frequency in MHz
    pub mhz: u16,
}

const fn entry(band: Band, channel: u8, register: u32, mhz: u16) -> ChannelEntry {
    ChannelEntry {
        band,
        channel,
        register,
        mhz,
    }
}

/// All 48 channels, channel 1-8 per band
pub const CHANNEL_TABLE: [ChannelEntry; 48] = [
    entry(Band::Raceband, 1, 0x281D, 5658),
    entry(Band::Raceband, 2, 0x288F, 5695),
    entry(Band::Raceband, 3, 0x2902, 5732),
    entry(Band::Raceband, 4, 0x2914, 5769),
    entry(Band::Raceband, 5, 0x2987, 5806),
    entry(Band::Raceband, 6, 0x2999, 5843),
    entry(Band::Raceband, 7, 0x2A0C, 5880),
    entry(Band::Raceband, 8, 0x2A1E, 5917),
    entry(Band::A, 1, 0x2A05, 5865),
    entry(Band::A, 2, 0x299B, 5845),
    entry(Band::A, 3, 0x2991, 5825),
    entry(Band::A, 4, 0x2987, 5805),
    entry(Band::A, 5, 0x291D, 5785),
    entry(Band::A, 6, 0x2913, 5765),
    entry(Band::A, 7, 0x2909, 5745),
    entry(Band::A, 8, 0x289F, 5725),
    entry(Band::B, 1, 0x2903, 5733),
    entry(Band::B, 2, 0x290C, 5752),
    entry(Band::B, 3, 0x2916, 5771),
    entry(Band::B, 4, 0x291F, 5790),
    entry(Band::B, 5, 0x2989, 5809),
    entry(Band::B, 6, 0x2992, 5828),
    entry(Band::B, 7, 0x299C, 5847),
    entry(Band::B, 8, 0x2A05, 5866),
    entry(Band::E, 1, 0x2895, 5705),
    entry(Band::E, 2, 0x288B, 5685),
    entry(Band::E, 3, 0x2881, 5665),
    entry(Band::E, 4, 0x2817, 5645),
    entry(Band::E, 5, 0x2A0F, 5885),
    entry(Band::E, 6, 0x2A19, 5905),
    entry(Band::E, 7, 0x2A83, 5925),
    entry(Band::E, 8, 0x2A8D, 5945),
    entry(Band::F, 1, 0x2906, 5740),
    entry(Band::F, 2, 0x2910, 5760),
    entry(Band::F, 3, 0x291A, 5780),
    entry(Band::F, 4, 0x2984, 5800),
    entry(Band::F, 5, 0x298E, 5820),
    entry(Band::F, 6, 0x2998, 5840),
    entry(Band::F, 7, 0x2A02, 5860),
    entry(Band::F, 8, 0x2A0C, 5880),
    entry(Band::D, 1, 0x2609, 5362),
    entry(Band::D, 2, 0x261C, 5399),
    entry(Band::D, 3, 0x268E, 5436),
    entry(Band::D, 4, 0x2701, 5473),
    entry(Band::D, 5, 0x2713, 5510),
    entry(Band::D, 6, 0x2786, 5547),
    entry(Band::D, 7, 0x2798, 5584),
    entry(Band::D, 8, 0x280B, 5621),
];

/// Look up the register value for an exact frequency match
pub fn register_for_mhz(mhz: u16) -> Option<u32> {
    CHANNEL_TABLE
        .iter()
        .find(|e| e.mhz == mhz)
        .map(|e| e.register)
}

/// Look up the frequency for an exact register value match
pub fn mhz_for_register(register: u32) -> Option<u16> {
    CHANNEL_TABLE
        .iter()
        .find(|e| e.register == register)
        .map(|e| e.mhz)
}

/// Full table entry for an exact frequency match
pub fn entry_for_mhz(mhz: u16) -> Option<&'static ChannelEntry> {
    CHANNEL_TABLE.iter().find(|e| e.mhz == mhz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        assert_eq!(CHANNEL_TABLE.len(), 48);
        for band in [Band::Raceband, Band::A, Band::B, Band::E, Band::F, Band::D] {
            let channels: Vec<u8> = CHANNEL_TABLE
                .iter()
                .filter(|e| e.band == band)
                .map(|e| e.channel)
                .collect();
            assert_eq!(channels, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        }
    }

    #[test]
    fn test_exact_lookup() {
        assert_eq!(register_for_mhz(5658), Some(0x281D));
        assert_eq!(mhz_for_register(0x281D), Some(5658));
        assert_eq!(register_for_mhz(5621), Some(0x280B));
    }

    #[test]
    fn test_unknown_frequency() {
        assert_eq!(register_for_mhz(1234), None);
        assert_eq!(register_for_mhz(5659), None);
        assert_eq!(mhz_for_register(0xFFFFF), None);
    }

    #[test]
    fn test_collisions_resolve_in_table_order() {
        // 5880MHz is both Raceband 7 and Band F 8, same register value.
        assert_eq!(register_for_mhz(5880), Some(0x2A0C));
        // 0x2A05 is Band A 1 (5865) and Band B 8 (5866); A comes first.
        assert_eq!(mhz_for_register(0x2A05), Some(5865));
        // 0x2987 is Raceband 5 (5806) and Band A 4 (5805); Raceband first.
        assert_eq!(mhz_for_register(0x2987), Some(5806));
    }

    #[test]
    fn test_entry_lookup() {
        let e = entry_for_mhz(5917).unwrap();
        assert_eq!(e.band, Band::Raceband);
        assert_eq!(e.channel, 8);
        assert_eq!(e.register, 0x2A1E);
    }

    #[test]
    fn test_registers_fit_in_20_bits() {
        for e in &CHANNEL_TABLE {
            assert!(e.register < (1 << 20), "{:#X} out of range", e.register);
        }
    }
}
