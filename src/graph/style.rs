use eframe::egui::Color32;

use super::model::{Entity, Relationship, TypeTag};

/// Fill used when no constructor scale can be built (no CLASS entities).
pub const DEFAULT_FILL: Color32 = Color32::WHITE;
pub const INTERFACE_FILL: Color32 = Color32::BLACK;

const PATTERN_TAGS: [TypeTag; 4] = [
    TypeTag::Strategy,
    TypeTag::Factory,
    TypeTag::Template,
    TypeTag::Decorator,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstructorScale {
    low: f32,
    high: f32,
}

impl ConstructorScale {
    /// Domain is `[min - 3, max]`; `None` when there are no CLASS entities.
    pub fn from_entities(entities: &[Entity]) -> Option<Self> {
        let mut counts = entities
            .iter()
            .filter(|entity| entity.is_class())
            .map(|entity| entity.constructors);
        let first = counts.next()?;
        let (min, max) = counts.fold((first, first), |(min, max), count| {
            (min.min(count), max.max(count))
        });

        Some(Self {
            low: min as f32 - 3.0,
            high: max as f32,
        })
    }

    pub fn color(&self, constructors: u32) -> Color32 {
        let t = ((constructors as f32 - self.low) / (self.high - self.low)).clamp(0.0, 1.0);
        let fade = (255.0 * (1.0 - t)).round() as u8;
        Color32::from_rgb(255, fade, fade)
    }
}

pub fn fill_color(entity: &Entity, scale: Option<&ConstructorScale>) -> Color32 {
    if entity.is_interface() {
        return INTERFACE_FILL;
    }

    scale.map_or(DEFAULT_FILL, |scale| scale.color(entity.constructors))
}

/// First letters of the design-pattern tags carried by the entity, e.g. `"S, F"`.
pub fn pattern_glyph(types: &[TypeTag]) -> String {
    PATTERN_TAGS
        .iter()
        .filter(|tag| types.contains(*tag))
        .filter_map(|tag| tag.as_str().chars().next())
        .map(String::from)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeDash {
    Solid,
    Dashed,
}

impl StrokeDash {
    pub fn for_entity(entity: &Entity) -> Self {
        if entity.has(&TypeTag::Abstract) {
            Self::Dashed
        } else {
            Self::Solid
        }
    }
}

pub fn stroke_width(entity: &Entity) -> f32 {
    entity.nb_variants as f32
}

pub fn contrast_color(fill: Color32) -> Color32 {
    let luminance =
        (0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32) / 255.0;
    if luminance > 0.5 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

pub fn entity_title(entity: &Entity) -> String {
    let types = entity
        .types
        .iter()
        .map(TypeTag::as_str)
        .collect::<Vec<_>>()
        .join(",");
    format!("types: {types}\nname: {}", entity.name)
}

pub fn relationship_title(relationship: &Relationship) -> String {
    format!(
        "source: {}\ntarget: {}",
        relationship.source, relationship.target
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::BASE_RADIUS;

    fn entity(name: &str, types: Vec<TypeTag>, constructors: u32) -> Entity {
        Entity {
            name: name.to_owned(),
            types,
            methods: 0,
            constructors,
            nb_variants: 2,
            radius: BASE_RADIUS,
        }
    }

    #[test]
    fn scale_spans_white_to_red_over_class_constructors() {
        let entities = vec![
            entity("A", vec![TypeTag::Class], 1),
            entity("B", vec![TypeTag::Class], 5),
            entity("I", vec![TypeTag::Interface], 40),
        ];
        let scale = ConstructorScale::from_entities(&entities).expect("class entities present");

        assert_eq!(scale.color(5), Color32::from_rgb(255, 0, 0));
        assert_eq!(scale.color(1), Color32::from_rgb(255, 146, 146));
        assert_eq!(fill_color(&entities[2], Some(&scale)), INTERFACE_FILL);
    }

    #[test]
    fn scale_is_absent_without_classes() {
        let entities = vec![entity("I", vec![TypeTag::Interface], 0)];
        assert_eq!(ConstructorScale::from_entities(&entities), None);

        let other = entity("E", vec![TypeTag::Other("ENUM".to_owned())], 1);
        assert_eq!(fill_color(&other, None), DEFAULT_FILL);
    }

    #[test]
    fn glyph_lists_patterns_in_fixed_priority_order() {
        let types = vec![TypeTag::Decorator, TypeTag::Class, TypeTag::Strategy];
        assert_eq!(pattern_glyph(&types), "S, D");
        assert_eq!(pattern_glyph(&[TypeTag::Class]), "");
    }

    #[test]
    fn abstract_entities_are_dashed() {
        let abstract_class = entity("A", vec![TypeTag::Class, TypeTag::Abstract], 0);
        assert_eq!(StrokeDash::for_entity(&abstract_class), StrokeDash::Dashed);
        assert_eq!(stroke_width(&abstract_class), 2.0);
    }

    #[test]
    fn label_contrast_follows_fill_luminance() {
        assert_eq!(contrast_color(Color32::BLACK), Color32::WHITE);
        assert_eq!(contrast_color(Color32::WHITE), Color32::BLACK);
        assert_eq!(contrast_color(Color32::from_rgb(255, 0, 0)), Color32::WHITE);
    }

    #[test]
    fn title_lists_types_then_name() {
        let shape = entity("Shape", vec![TypeTag::Class, TypeTag::Vp], 0);
        assert_eq!(entity_title(&shape), "types: CLASS,VP\nname: Shape");
    }
}
