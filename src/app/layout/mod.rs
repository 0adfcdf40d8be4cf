//! Force-directed layout with alpha cooling.
//!
//! Each tick nudges velocities with a spring along every link, a many-body
//! charge between all bodies and a centering shift, then integrates with
//! velocity decay. The energy budget `alpha` decays geometrically toward
//! `alpha_target`; the simulation stops once it falls below `alpha_min`.

mod forces;
mod quadtree;

use eframe::egui::Vec2;

use forces::{LinkWeights, apply_center, apply_charge, apply_links};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub link_distance: f32,
    pub charge: f32,
    pub center_strength: f32,
    pub theta: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub drag_alpha_target: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            link_distance: 100.0,
            charge: -50.0,
            center_strength: 1.0,
            theta: 0.9,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

impl Body {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            pinned: None,
        }
    }
}

pub struct Simulation {
    config: LayoutConfig,
    bodies: Vec<Body>,
    links: Vec<(usize, usize)>,
    weights: LinkWeights,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    active_drags: usize,
    positions_scratch: Vec<Vec2>,
}

impl Simulation {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            links: Vec::new(),
            weights: LinkWeights::new(0, &[]),
            center: Vec2::ZERO,
            alpha: 1.0,
            alpha_target: 0.0,
            running: false,
            active_drags: 0,
            positions_scratch: Vec::new(),
        }
    }

    pub fn reseed(&mut self, bodies: Vec<Body>, links: Vec<(usize, usize)>) {
        let body_count = bodies.len();
        let links = links
            .into_iter()
            .filter(|&(source, target)| source < body_count && target < body_count)
            .collect::<Vec<_>>();
        self.weights = LinkWeights::new(body_count, &links);
        self.bodies = bodies;
        self.links = links;
        self.active_drags = 0;
    }

    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.running = true;
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
    }

    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances one step; returns whether the layout is still moving.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        apply_links(
            &mut self.bodies,
            &self.links,
            &self.weights,
            self.config.link_distance,
            alpha,
        );

        self.positions_scratch.clear();
        self.positions_scratch
            .extend(self.bodies.iter().map(|body| body.position));
        apply_charge(
            &mut self.bodies,
            &self.positions_scratch,
            self.config.charge,
            self.config.theta,
            alpha,
        );
        apply_center(&mut self.bodies, self.center, self.config.center_strength);

        let retained = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            if let Some(pin) = body.pinned {
                body.position = pin;
                body.velocity = Vec2::ZERO;
            } else {
                body.velocity *= retained;
                body.position += body.velocity;
            }
        }

        if self.alpha < self.config.alpha_min {
            self.running = false;
            tracing::debug!("layout settled");
        }
        self.running
    }

    pub fn drag_start(&mut self, index: usize, pointer: Vec2) {
        let Some(body) = self.bodies.get_mut(index) else {
            return;
        };
        body.pinned = Some(pointer);

        if self.active_drags == 0 {
            self.alpha_target = self.config.drag_alpha_target;
            self.running = true;
        }
        self.active_drags += 1;
    }

    pub fn drag_move(&mut self, index: usize, pointer: Vec2) {
        if let Some(body) = self.bodies.get_mut(index)
            && body.pinned.is_some()
        {
            body.pinned = Some(pointer);
        }
    }

    pub fn drag_end(&mut self, index: usize) {
        let Some(body) = self.bodies.get_mut(index) else {
            return;
        };
        if body.pinned.take().is_none() {
            return;
        }

        self.active_drags = self.active_drags.saturating_sub(1);
        if self.active_drags == 0 {
            self.alpha_target = 0.0;
        }
    }
}
