use rgb::RGB8;

/// A 24 bit color packed as `r * 65536 + g * 256 + b`, as published by the canvas.
pub type PackedColor = u32;

/// Largest value a [`PackedColor`] may hold.
pub const MAX_PACKED_COLOR: PackedColor = 0x00FF_FFFF;

/// Split a packed color into its channels.
///
/// Callers must only pass values up to [`MAX_PACKED_COLOR`]; frames are validated on ingest.
#[inline]
pub fn decode(color: PackedColor) -> RGB8 {
    RGB8::new(
        (color / 65536) as u8,
        ((color / 256) % 256) as u8,
        (color % 256) as u8,
    )
}

#[cfg(test)]
#[inline]
pub fn encode(rgb: RGB8) -> PackedColor {
    PackedColor::from(rgb.r) * 65536 + PackedColor::from(rgb.g) * 256 + PackedColor::from(rgb.b)
}
