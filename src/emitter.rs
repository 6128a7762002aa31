use std::f32::consts::PI;

use crate::error::{Error, Result};

pub const TWO_PI: f32 = 2.0 * PI;

/// Upper bound on `ceil(max_radius / wavelength)`.
pub const MAX_RINGS: usize = 10_000;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One wavefront of an emitter, as seen on a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ring {
    pub radius: f32,
    pub opacity: f32,
}

/// A point source producing concentric rings that expand at `speed` and
/// recycle every wavelength.
#[derive(Clone, Debug)]
pub struct Emitter {
    position: Position,
    speed: f32,
    wavelength: f32,
    period: f32,
    phase: f32,
    start_offset: f32,
    // f64 so frame-sized steps still register after days of running.
    elapsed: f64,
    ring_count: usize,
    opacity: f32,
}

impl Emitter {
    pub fn new(
        position: Position,
        speed: f32,
        frequency: f32,
        phase: f32,
        max_radius: f32,
        opacity: f32,
    ) -> Result<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(Error::InvalidFrequency(frequency));
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidSpeed(speed));
        }
        if !max_radius.is_finite() || max_radius < 0.0 {
            return Err(Error::InvalidRadius(max_radius));
        }

        let wavelength = speed / frequency;
        let ring_count = (max_radius / wavelength).ceil();
        if ring_count > MAX_RINGS as f32 {
            return Err(Error::InvalidRadius(max_radius));
        }

        let mut emitter = Self {
            position,
            speed,
            wavelength,
            period: 1.0 / frequency,
            phase: 0.0,
            start_offset: 0.0,
            elapsed: 0.0,
            ring_count: ring_count as usize,
            opacity,
        };
        emitter.set_phase(phase);
        Ok(emitter)
    }

    /// Stores `phi` wrapped into `[0, 2π)` and restarts the emitter clock.
    ///
    /// The start offset places the first ring at the fractional position the
    /// phase asks for, so it appears without a jump.
    pub fn set_phase(&mut self, phi: f32) {
        self.phase = wrap(phi, TWO_PI);
        self.start_offset = self.period * (1.0 - self.phase / TWO_PI);
        self.elapsed = 0.0;
    }

    pub fn increment(&mut self, dt: f32) {
        self.elapsed += f64::from(dt);
    }

    /// Rings in index order for the current clock.
    ///
    /// Before the start offset is reached every ring sits at radius 0 and is
    /// fully transparent. Afterwards ring `i` is `i` wavelengths out plus a
    /// sweep that cycles once per wavelength, and it only becomes visible once
    /// more than `i` periods have passed since the start offset.
    pub fn rings(&self) -> Vec<Ring> {
        let since_start = self.elapsed - f64::from(self.start_offset);
        if since_start < 0.0 {
            return vec![Ring::default(); self.ring_count];
        }

        let lit = (since_start / f64::from(self.period)) as f32;
        // c·T = λ, so only the clock within the current period moves the sweep.
        let cycle = (self.elapsed % f64::from(self.period)) as f32;
        let sweep = wrap(
            self.wavelength * self.phase / TWO_PI + self.speed * cycle,
            self.wavelength,
        );

        (0..self.ring_count)
            .map(|i| {
                let i = i as f32;
                Ring {
                    radius: i * self.wavelength + sweep,
                    opacity: if i < lit { self.opacity } else { 0.0 },
                }
            })
            .collect()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn wavelength(&self) -> f32 {
        self.wavelength
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn start_offset(&self) -> f32 {
        self.start_offset
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn ring_count(&self) -> usize {
        self.ring_count
    }
}

/// Wraps `x` into `[0, x_max)`, mirroring negative inputs.
///
/// Exact multiples can land on `x_max` itself through rounding. NaN is
/// returned unchanged.
pub fn wrap(x: f32, x_max: f32) -> f32 {
    if x.is_nan() {
        x
    } else if x >= 0.0 {
        x - (x / x_max).floor() * x_max
    } else {
        x_max - wrap(-x, x_max)
    }
}
