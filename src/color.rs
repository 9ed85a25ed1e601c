
/// Linear RGB triple in `0.0..=1.0`, the color type shared by materials, lights and backgrounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);
    pub const BLACK: Rgb = Rgb([0.0, 0.0, 0.0]);

    /// Builds a color from a packed `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Rgb([
            ((hex >> 16) & 0xFF) as f32 / 255.0,
            ((hex >> 8) & 0xFF) as f32 / 255.0,
            (hex & 0xFF) as f32 / 255.0,
        ])
    }

    pub fn to_hex(self) -> u32 {
        let [r, g, b] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u32);
        (r << 16) | (g << 8) | b
    }

    pub fn to_array(self) -> [f32; 3] {
        self.0
    }

    pub fn scaled(self, factor: f32) -> Self {
        Rgb(self.0.map(|c| c * factor))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(value: [f32; 3]) -> Self {
        Rgb(value)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}
