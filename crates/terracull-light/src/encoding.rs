//! 16-bit colored light texels.
//!
//! Layout, high to low: red (4 bits), green (4), blue (4), flags (4).
//! Flag bit 0 marks a light source, bit 1 an occluding block.

use bytemuck::{Pod, Zeroable};

const LIGHT_SOURCE_FLAG: u16 = 0b01;
const OCCLUDING_FLAG: u16 = 0b10;
const PURE_MASK: u16 = 0xfff0;

/// One light texel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Light(pub u16);

impl Light {
    pub const DARK: Self = Self(0);

    /// Encode channel levels (`0..=15`) and flags.
    #[inline]
    #[must_use]
    pub const fn encode(r: u8, g: u8, b: u8, is_light_source: bool, is_occluding: bool) -> Self {
        debug_assert!(r < 16 && g < 16 && b < 16);
        let rgb = ((r as u16 & 0xf) << 12) | ((g as u16 & 0xf) << 8) | ((b as u16 & 0xf) << 4);
        Self(rgb).with_flags(is_light_source, is_occluding)
    }

    /// Replace the flags, keeping the color.
    #[inline]
    #[must_use]
    pub const fn with_flags(self, is_light_source: bool, is_occluding: bool) -> Self {
        let mut bits = self.0 & PURE_MASK;
        if is_light_source {
            bits |= LIGHT_SOURCE_FLAG;
        }
        if is_occluding {
            bits |= OCCLUDING_FLAG;
        }
        Self(bits)
    }

    /// The color with all flags cleared.
    #[inline]
    #[must_use]
    pub const fn pure(self) -> Self {
        Self(self.0 & PURE_MASK)
    }

    #[inline]
    pub const fn is_light_source(self) -> bool {
        self.0 & LIGHT_SOURCE_FLAG != 0
    }

    #[inline]
    pub const fn is_occluding(self) -> bool {
        self.0 & OCCLUDING_FLAG != 0
    }

    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 >> 12) as u8 & 0xf
    }

    #[inline]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8 & 0xf
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        (self.0 >> 4) as u8 & 0xf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_and_flags() {
        let light = Light::encode(15, 7, 1, true, false);
        assert_eq!(light.0, 0xf711);
        assert_eq!((light.red(), light.green(), light.blue()), (15, 7, 1));
        assert!(light.is_light_source());
        assert!(!light.is_occluding());
    }

    #[test]
    fn pure_strips_flags() {
        let light = Light::encode(3, 4, 5, true, true);
        assert_eq!(light.pure(), Light::encode(3, 4, 5, false, false));
        assert_eq!(light.pure().0 & 0xf, 0);
    }

    #[test]
    fn flags_replace_not_accumulate() {
        let light = Light::encode(1, 2, 3, true, true).with_flags(false, true);
        assert!(!light.is_light_source());
        assert!(light.is_occluding());
        assert_eq!(light.pure(), Light::encode(1, 2, 3, false, false));
    }
}
