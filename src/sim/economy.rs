//! Speed bookkeeping for the lane chapter
//!
//! Every change goes through [`SpeedEconomy`], which keeps the value inside
//! `[0, max]` and applies per-hazard floors.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedEconomy {
    current: f32,
    max: f32,
}

impl SpeedEconomy {
    pub fn new(start: f32, max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: start.clamp(0.0, max),
            max,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Fraction of max speed in [0, 1]
    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    pub fn add(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
    }

    /// Accelerate, but never past `cap` (already being above it is kept)
    pub fn accelerate_to(&mut self, amount: f32, cap: f32) {
        if self.current >= cap {
            return;
        }
        self.current = (self.current + amount).min(cap).clamp(0.0, self.max);
    }

    /// Subtract `amount`; the result never drops below `floor` unless it was
    /// already lower
    pub fn reduce(&mut self, amount: f32, floor: f32) {
        let floor = floor.min(self.current).max(0.0);
        self.current = (self.current - amount).max(floor).min(self.max);
    }

    /// Within `tolerance` of max speed
    pub fn at_max(&self, tolerance: f32) -> bool {
        self.current >= self.max - tolerance
    }

    /// Linear difficulty in `[min, max]` from the current speed
    pub fn difficulty(&self, min: f32, max: f32) -> f32 {
        (min + (max - min) * self.ratio()).clamp(min, max)
    }
}
