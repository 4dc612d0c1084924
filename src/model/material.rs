//! Material identifiers and their classification channel encoding

use std::fmt;
use std::num::NonZeroU8;

use crate::error::{Error, Result};

/// Voxel value for empty space
pub const EMPTY: u8 = 0;

/// Scale between a material id and its fractional channel value
const CHANNEL_SCALE: f32 = 256.0;

/// A material identifier in `1..=255`
///
/// Zero is reserved for empty space and can never be a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(NonZeroU8);

impl MaterialId {
    /// Create a material id, returning `None` for 0
    pub const fn new(id: u8) -> Option<Self> {
        match NonZeroU8::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// The id as a voxel byte
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// Encode the id as a fractional colour channel value (`id / 256`)
    pub fn encode(self) -> f32 {
        f32::from(self.get()) / CHANNEL_SCALE
    }
}

impl TryFrom<u32> for MaterialId {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self> {
        u8::try_from(id)
            .ok()
            .and_then(MaterialId::new)
            .ok_or_else(|| Error::config(format!("material id {} is outside 1..=255", id)))
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Decode a colour channel value read back from the render target
///
/// Inverse of [`MaterialId::encode`]; exact for every id in `1..=255`.
/// Uncovered pixels (0.0) decode to [`EMPTY`].
pub fn decode_channel(value: f32) -> u8 {
    (value * CHANNEL_SCALE).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_not_a_material() {
        assert!(MaterialId::new(0).is_none());
        assert!(MaterialId::try_from(0u32).is_err());
        assert!(MaterialId::try_from(256u32).is_err());
        assert_eq!(MaterialId::try_from(255u32).unwrap().get(), 255);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for id in 1..=255u8 {
            let material = MaterialId::new(id).unwrap();
            assert_eq!(decode_channel(material.encode()), id, "material {}", id);
        }
    }

    #[test]
    fn test_decode_clamps() {
        assert_eq!(decode_channel(0.0), EMPTY);
        assert_eq!(decode_channel(-1.0), 0);
        assert_eq!(decode_channel(2.0), 255);
    }
}
