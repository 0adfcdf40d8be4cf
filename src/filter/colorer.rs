use eframe::egui::Color32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FilterItem, FilterKind, FilterSet, classify};

pub const UNCOLORED: Color32 = Color32::from_rgb(255, 0, 0);

fn hsl_full_saturation(hue: f32) -> Color32 {
    let sector = hue.rem_euclid(360.0) / 60.0;
    let x = 1.0 - ((sector % 2.0) - 1.0).abs();
    let (r, g, b) = match sector as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let channel = |value: f32| (value * 255.0).round() as u8;
    Color32::from_rgb(channel(r), channel(g), channel(b))
}

/// Token store that assigns each package token a random color for its lifetime.
///
/// Its tokens paint nodes rather than hide them. Class tokens are not packages
/// and are never stored.
#[derive(Debug)]
pub struct PackageColorer {
    entries: Vec<(String, Color32)>,
    rng: StdRng,
    revision: u64,
}

impl Default for PackageColorer {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl PackageColorer {
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            entries: Vec::new(),
            rng,
            revision: 0,
        }
    }

    pub fn color_of(&self, token: &str) -> Option<Color32> {
        self.entries
            .iter()
            .find(|(stored, _)| stored == token)
            .map(|(_, color)| *color)
    }

    /// Longest stored prefix of `name` wins; [`UNCOLORED`] when none applies.
    pub fn color_for_entity(&self, name: &str) -> Color32 {
        let mut best: Option<(usize, Color32)> = None;
        for (token, color) in &self.entries {
            if !name.starts_with(token.as_str()) {
                continue;
            }
            if best.is_none_or(|(length, _)| token.len() >= length) {
                best = Some((token.len(), *color));
            }
        }
        best.map_or(UNCOLORED, |(_, color)| color)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FilterSet for PackageColorer {
    fn add_value(&mut self, token: &str) {
        if classify(token) == FilterKind::Exact || self.color_of(token).is_some() {
            return;
        }
        let hue = self.rng.gen_range(0.0..360.0);
        self.entries.push((token.to_owned(), hsl_full_saturation(hue)));
        self.revision += 1;
    }

    fn remove_value(&mut self, token: &str) {
        if let Some(position) = self.entries.iter().position(|(stored, _)| stored == token) {
            self.entries.remove(position);
            self.revision += 1;
        }
    }

    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token, _)| token.as_str())
    }

    fn render_item(&self, token: &str) -> FilterItem {
        FilterItem {
            token: token.to_owned(),
            background: self.color_of(token),
        }
    }
}
