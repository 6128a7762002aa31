use tracing::{debug, trace};

use crate::emitter::{Emitter, Position};
use crate::error::Result;
use crate::focus::phase_from_focus;
use crate::parameters::Parameters;

/// A ring placed in the world, ready to be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Position,
    pub radius: f32,
    pub opacity: f32,
}

/// Collects emitters in layout order until [`finalize`](Self::finalize).
#[derive(Debug, Default)]
pub struct EmitterArrayBuilder {
    emitters: Vec<Emitter>,
}

impl EmitterArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, emitter: Emitter) -> Self {
        self.emitters.push(emitter);
        self
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    /// Advances every emitter by the smallest start offset so the earliest
    /// one emits on the first frame. An empty builder gives an empty array.
    pub fn finalize(self) -> EmitterArray {
        let count = self.len();
        let mut array = EmitterArray {
            emitters: self.emitters,
        };

        let offset = array
            .emitters
            .iter()
            .map(Emitter::start_offset)
            .fold(None, |min: Option<f32>, t0| {
                Some(min.map_or(t0, |min| min.min(t0)))
            });

        if let Some(offset) = offset {
            debug!(emitters = count, offset, "removing start offset");
            array.increment(offset);
        }

        array
    }
}

/// Emitters sharing one clock. Its composition is fixed once built.
#[derive(Clone, Debug, Default)]
pub struct EmitterArray {
    emitters: Vec<Emitter>,
}

impl EmitterArray {
    /// Lays `parameters.emitter_count` emitters evenly on `y = 0` between
    /// `-λ` and `λ` and phases each one to converge on `focus`.
    pub fn focused_line(parameters: &Parameters, focus: &Position) -> Result<Self> {
        parameters.validate()?;

        let half_span = parameters.wavelength();
        let count = parameters.emitter_count;
        let step = if count > 1 {
            2.0 * half_span / (count - 1) as f32
        } else {
            0.0
        };

        let mut builder = EmitterArrayBuilder::new();
        for i in 0..count {
            let position = Position::new(-half_span + step * i as f32, 0.0);
            let mut emitter = Emitter::new(
                position,
                parameters.speed,
                parameters.frequency,
                0.0,
                parameters.max_radius,
                parameters.opacity,
            )?;
            emitter.set_phase(phase_from_focus(focus, &emitter));
            trace!(
                x = position.x,
                phase = emitter.phase(),
                start_offset = emitter.start_offset(),
                period = emitter.period(),
                rings = emitter.ring_count(),
                "emitter phased"
            );
            builder = builder.push(emitter);
        }

        Ok(builder.finalize())
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn increment(&mut self, dt: f32) {
        for emitter in self.emitters.iter_mut() {
            emitter.increment(dt);
        }
    }

    /// All rings, grouped by emitter in insertion order, then by ring index.
    pub fn circles(&self) -> Vec<Circle> {
        self.emitters
            .iter()
            .flat_map(|emitter| {
                let center = emitter.position();
                emitter.rings().into_iter().map(move |ring| Circle {
                    center,
                    radius: ring.radius,
                    opacity: ring.opacity,
                })
            })
            .collect()
    }
}
