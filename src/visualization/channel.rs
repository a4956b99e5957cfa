//! The three visualized channels and their fixed per-channel constants.

/// A visualized channel. Order is fixed: left, right, vocal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Left,
    Right,
    Vocal,
}

impl Channel {
    pub const COUNT: usize = 3;

    /// All channels in draw order (vocal last, on top).
    pub const ALL: [Channel; Channel::COUNT] = [Channel::Left, Channel::Right, Channel::Vocal];

    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Vocal => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Vocal => "Vocal",
        }
    }

    /// Band colour as RGB.
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Self::Left => (0xec, 0x9a, 0x39),
            Self::Right => (0x5a, 0xc5, 0xdb),
            Self::Vocal => (0xd0, 0x3f, 0x71),
        }
    }

    /// Height multiplier; the filtered vocal signal is quieter and drawn taller.
    pub fn amplitude_multiplier(self) -> f32 {
        match self {
            Self::Left | Self::Right => 1.0,
            Self::Vocal => 3.0,
        }
    }

    /// Exponent applied to each sample's deviation in the volume estimate.
    pub fn volume_exponent(self) -> f32 {
        match self {
            Self::Left | Self::Right => 1.0,
            Self::Vocal => 1.5,
        }
    }

    /// Volume that maps to full glow.
    pub fn glow_divisor(self) -> f32 {
        match self {
            Self::Left | Self::Right => 15.0,
            Self::Vocal => 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_draw_order() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
        assert_eq!(Channel::ALL.last(), Some(&Channel::Vocal));
    }
}
