use std::{f32::consts::TAU, ops::Range};

use crate::types::{ParticleShape, Point};

/// How many particles a burst spawns and the ranges their motion is drawn from.
#[derive(Clone, Debug, PartialEq)]
pub struct BurstParams {
    pub count: usize,
    /// Pixels per frame.
    pub speed: Range<f32>,
    /// Frames.
    pub life: Range<f32>,
}

impl Default for BurstParams {
    fn default() -> Self {
        Self {
            count: 8,
            speed: 1.0..3.0,
            life: 20.0..30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub color: [u8; 4],
    pub shape: ParticleShape,
    fade_span: f32,
}

impl Particle {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Linear fade: full opacity at `fade_span` frames of life left, zero at none.
    pub fn opacity(&self) -> f32 {
        if self.fade_span <= 0.0 {
            return 0.0;
        }
        (self.life / self.fade_span).clamp(0.0, 1.0)
    }
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: fastrand::Rng,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            particles: Vec::new(),
            rng,
        }
    }

    pub fn spawn_burst(
        &mut self,
        origin: Point,
        color: [u8; 4],
        shape: ParticleShape,
        params: &BurstParams,
    ) {
        self.particles.reserve(params.count);
        for _ in 0..params.count {
            let angle = self.rng.f32() * TAU;
            let speed = sample(&mut self.rng, &params.speed);
            let life = sample(&mut self.rng, &params.life);
            self.particles.push(Particle {
                x: origin.x,
                y: origin.y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life,
                color,
                shape,
                fade_span: params.life.end.max(params.life.start),
            });
        }
    }

    /// Steps every particle by one frame and drops the expired ones.
    pub fn advance(&mut self) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= 1.0;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn sample(rng: &mut fastrand::Rng, range: &Range<f32>) -> f32 {
    if range.end <= range.start {
        return range.start;
    }
    range.start + rng.f32() * (range.end - range.start)
}
