use std::ops::Range;

use eframe::egui::Vec2;

const LEAF_BODIES: usize = 8;
const MAX_DEPTH: usize = 12;

pub(super) struct Cell {
    pub(super) size: f32,
    pub(super) centroid: Vec2,
    pub(super) mass: f32,
    bodies: Range<usize>,
    children: Vec<usize>,
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Barnes-Hut tree stored as an arena; every cell owns a contiguous run of `order`.
pub(super) struct QuadTree {
    cells: Vec<Cell>,
    order: Vec<usize>,
}

fn quadrant(center: Vec2, point: Vec2) -> usize {
    usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let first = *positions.first()?;
        let (min, max) = positions
            .iter()
            .fold((first, first), |(min, max), &point| (min.min(point), max.max(point)));
        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let mut tree = Self {
            cells: Vec::new(),
            order: (0..positions.len()).collect(),
        };
        let size = (max - min).max_elem().max(1.0) + 2.0;
        tree.split(positions, 0..positions.len(), (min + max) * 0.5, size, 0);
        Some(tree)
    }

    fn split(
        &mut self,
        positions: &[Vec2],
        bodies: Range<usize>,
        center: Vec2,
        size: f32,
        depth: usize,
    ) -> usize {
        let id = self.cells.len();
        let mass = bodies.len() as f32;
        let centroid = self.order[bodies.clone()]
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
            / mass;
        self.cells.push(Cell {
            size,
            centroid,
            mass,
            bodies: bodies.clone(),
            children: Vec::new(),
        });

        if depth >= MAX_DEPTH || bodies.len() <= LEAF_BODIES {
            return id;
        }

        let run = &mut self.order[bodies.clone()];
        run.sort_unstable_by_key(|&index| quadrant(center, positions[index]));
        let mut edges = [bodies.start; 5];
        for q in 0..4 {
            let before = run.partition_point(|&index| quadrant(center, positions[index]) <= q);
            edges[q + 1] = bodies.start + before;
        }

        // Bodies sharing one quadrant (coincident ones included) stay in this leaf.
        if edges.windows(2).any(|edge| edge[1] - edge[0] == bodies.len()) {
            return id;
        }

        let quarter = size * 0.25;
        let mut children = Vec::with_capacity(4);
        for q in 0..4 {
            if edges[q] == edges[q + 1] {
                continue;
            }
            let offset = Vec2::new(
                if q & 1 == 1 { quarter } else { -quarter },
                if q & 2 == 2 { quarter } else { -quarter },
            );
            children.push(self.split(
                positions,
                edges[q]..edges[q + 1],
                center + offset,
                size * 0.5,
                depth + 1,
            ));
        }
        self.cells[id].children = children;
        id
    }

    pub(super) fn root(&self) -> &Cell {
        &self.cells[0]
    }

    pub(super) fn children<'a>(&'a self, cell: &'a Cell) -> impl Iterator<Item = &'a Cell> {
        cell.children.iter().map(|&id| &self.cells[id])
    }

    pub(super) fn bodies(&self, cell: &Cell) -> &[usize] {
        &self.order[cell.bodies.clone()]
    }
}
