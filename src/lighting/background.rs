//! Background catalog. Pure lookups; the star field is generated on demand.

use crate::color::Rgb;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackgroundId {
    #[default]
    White,
    Gray,
    Black,
    Space,
}

#[derive(Debug)]
pub struct BackgroundSpec {
    pub id: BackgroundId,
    pub display_name: &'static str,
    pub color: Rgb,
    pub stars_enabled: bool,
}

static BACKGROUNDS: [BackgroundSpec; 4] = [
    BackgroundSpec {
        id: BackgroundId::White,
        display_name: "White",
        color: Rgb::from_hex(0xffffff),
        stars_enabled: false,
    },
    BackgroundSpec {
        id: BackgroundId::Gray,
        display_name: "Gray",
        color: Rgb::from_hex(0x808080),
        stars_enabled: false,
    },
    BackgroundSpec {
        id: BackgroundId::Black,
        display_name: "Black",
        color: Rgb::from_hex(0x000000),
        stars_enabled: false,
    },
    BackgroundSpec {
        id: BackgroundId::Space,
        display_name: "Space",
        color: Rgb::from_hex(0x000000),
        stars_enabled: true,
    },
];

pub fn backgrounds() -> &'static [BackgroundSpec] {
    &BACKGROUNDS
}

impl BackgroundId {
    pub fn spec(self) -> &'static BackgroundSpec {
        &BACKGROUNDS[self as usize]
    }
}

/// Shell of points between `radius` and `radius + depth`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarField {
    pub radius: f32,
    pub depth: f32,
    pub count: usize,
    /// Point size multiplier.
    pub factor: f32,
}

impl Default for StarField {
    fn default() -> Self {
        Self {
            radius: 100.0,
            depth: 50.0,
            count: 5000,
            factor: 4.0,
        }
    }
}

impl StarField {
    /// Deterministic for a given seed.
    pub fn positions(&self, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..self.count)
            .map(|_| {
                let distance = self.radius + self.depth * rng.gen::<f32>();
                let z: f32 = rng.gen_range(-1.0..=1.0);
                let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
                let ring = (1.0 - z * z).max(0.0).sqrt();
                Vec3::new(ring * theta.cos(), ring * theta.sin(), z) * distance
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_space_has_stars() {
        for spec in backgrounds() {
            assert_eq!(spec.id.spec().display_name, spec.display_name);
            assert_eq!(spec.stars_enabled, spec.id == BackgroundId::Space);
        }
        assert_eq!(BackgroundId::Gray.spec().color.to_hex(), 0x808080);
    }

    #[test]
    fn stars_sit_in_the_shell() {
        let field = StarField {
            count: 200,
            ..Default::default()
        };
        let stars = field.positions(7);
        assert_eq!(stars.len(), 200);
        for star in &stars {
            let distance = star.length();
            assert!(distance >= 99.9 && distance <= 150.1, "{}", distance);
        }
        assert_eq!(stars, field.positions(7));
    }
}
