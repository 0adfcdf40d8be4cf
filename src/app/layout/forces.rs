use eframe::egui::{Vec2, vec2};

use super::Body;
use super::quadtree::{Cell, QuadTree};

const MIN_DISTANCE_SQ: f32 = 1.0;

/// Stand-in direction for coincident points, stable per index pair.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

pub(super) struct LinkWeights {
    strength: Vec<f32>,
    bias: Vec<f32>,
}

impl LinkWeights {
    pub(super) fn new(body_count: usize, links: &[(usize, usize)]) -> Self {
        let mut degree = vec![0u32; body_count];
        for &(source, target) in links {
            degree[source] += 1;
            degree[target] += 1;
        }

        let strength = links
            .iter()
            .map(|&(source, target)| 1.0 / degree[source].min(degree[target]).max(1) as f32)
            .collect();
        let bias = links
            .iter()
            .map(|&(source, target)| {
                degree[source] as f32 / (degree[source] + degree[target]).max(1) as f32
            })
            .collect();

        Self { strength, bias }
    }
}

pub(super) fn apply_links(
    bodies: &mut [Body],
    links: &[(usize, usize)],
    weights: &LinkWeights,
    distance: f32,
    alpha: f32,
) {
    for (link_index, &(source, target)) in links.iter().enumerate() {
        if source == target {
            continue;
        }

        let mut delta = (bodies[target].position + bodies[target].velocity)
            - (bodies[source].position + bodies[source].velocity);
        if delta.length_sq() == 0.0 {
            delta = jiggle(source, target);
        }
        let length = delta.length();
        let stretch = (length - distance) / length * alpha * weights.strength[link_index];
        let correction = delta * stretch;
        let bias = weights.bias[link_index];

        bodies[target].velocity -= correction * bias;
        bodies[source].velocity += correction * (1.0 - bias);
    }
}

/// Many-body charge; negative strength pushes bodies apart.
pub(super) fn apply_charge(
    bodies: &mut [Body],
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    alpha: f32,
) {
    if strength == 0.0 {
        return;
    }
    let Some(tree) = QuadTree::build(positions) else {
        return;
    };

    let charge = Charge {
        tree: &tree,
        positions,
        strength,
        theta_sq: theta * theta,
    };
    for (index, body) in bodies.iter_mut().enumerate() {
        body.velocity += charge.impulse_on(index, tree.root()) * alpha;
    }
}

struct Charge<'a> {
    tree: &'a QuadTree,
    positions: &'a [Vec2],
    strength: f32,
    theta_sq: f32,
}

impl Charge<'_> {
    fn impulse_on(&self, index: usize, cell: &Cell) -> Vec2 {
        let point = self.positions[index];

        if cell.is_leaf() {
            return self
                .tree
                .bodies(cell)
                .iter()
                .filter(|&&other| other != index)
                .map(|&other| {
                    let mut delta = self.positions[other] - point;
                    if delta.length_sq() == 0.0 {
                        delta = jiggle(index, other);
                    }
                    delta * (self.strength / softened(delta.length_sq()))
                })
                .fold(Vec2::ZERO, |sum, impulse| sum + impulse);
        }

        let delta = cell.centroid - point;
        let distance_sq = delta.length_sq();
        if cell.size * cell.size / self.theta_sq < distance_sq {
            return delta * (self.strength * cell.mass / softened(distance_sq));
        }

        self.tree
            .children(cell)
            .map(|child| self.impulse_on(index, child))
            .fold(Vec2::ZERO, |sum, impulse| sum + impulse)
    }
}

fn softened(distance_sq: f32) -> f32 {
    if distance_sq < MIN_DISTANCE_SQ {
        (MIN_DISTANCE_SQ * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

pub(super) fn apply_center(bodies: &mut [Body], center: Vec2, strength: f32) {
    if bodies.is_empty() {
        return;
    }

    let mean = bodies
        .iter()
        .fold(Vec2::ZERO, |sum, body| sum + body.position)
        / bodies.len() as f32;
    let shift = (mean - center) * strength;
    for body in bodies {
        body.position -= shift;
    }
}
