use serde::Deserialize;

use crate::emitter::MAX_RINGS;
use crate::error::{Error, Result};

pub const MAX_FPS: u32 = 1000;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Parameters {
    pub speed: f32,
    pub frequency: f32,
    pub emitter_count: usize,
    pub max_radius: f32,
    pub opacity: f32,
    pub fps: u32,
    pub view_width: f32,
    pub view_height: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            speed: 3.0,
            frequency: 0.2,
            emitter_count: 10,
            max_radius: 100.0,
            opacity: 0.6,
            fps: 30,
            view_width: 100.0,
            view_height: 100.0,
        }
    }
}

impl Parameters {
    pub fn wavelength(&self) -> f32 {
        self.speed / self.frequency
    }

    /// Length of one frame in simulated seconds.
    pub fn frame_time(&self) -> f32 {
        1.0 / self.fps as f32
    }

    pub fn validate(&self) -> Result<()> {
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(Error::InvalidFrequency(self.frequency));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(Error::InvalidSpeed(self.speed));
        }
        if !self.max_radius.is_finite() || self.max_radius < 0.0 {
            return Err(Error::InvalidRadius(self.max_radius));
        }
        let rings = (self.max_radius / self.wavelength()).ceil();
        if rings > MAX_RINGS as f32 {
            return Err(Error::InvalidParameters(format!(
                "max_radius {} needs {} rings per emitter, at most {} allowed",
                self.max_radius, rings, MAX_RINGS
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::InvalidParameters(format!(
                "opacity {} is outside 0..=1",
                self.opacity
            )));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(Error::InvalidParameters(format!(
                "fps {} is outside 1..={}",
                self.fps, MAX_FPS
            )));
        }
        if !(self.view_width > 0.0 && self.view_height > 0.0) {
            return Err(Error::InvalidParameters(format!(
                "view {}x{} must be positive",
                self.view_width, self.view_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        let parameters = Parameters::default();
        assert!(parameters.validate().is_ok());
        assert_relative_eq!(parameters.wavelength(), 15.0, epsilon = 1e-5);
        assert_relative_eq!(parameters.frame_time(), 1.0 / 30.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parameters: Parameters =
            serde_json::from_str(r#"{ "emitter_count": 4, "frequency": 0.5 }"#).unwrap();
        assert_eq!(parameters.emitter_count, 4);
        assert_relative_eq!(parameters.frequency, 0.5);
        assert_relative_eq!(parameters.speed, 3.0);
        assert_eq!(parameters.fps, 30);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let parameters: Parameters = serde_json::from_str(r#"{ "frequency": 0.0 }"#).unwrap();
        assert!(matches!(parameters.validate(), Err(Error::InvalidFrequency(_))));
    }

    #[test]
    fn test_bad_view_rejected() {
        let parameters = Parameters {
            view_height: 0.0,
            ..Parameters::default()
        };
        assert!(matches!(parameters.validate(), Err(Error::InvalidParameters(_))));

        let parameters = Parameters {
            fps: 0,
            ..Parameters::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn test_fps_above_timer_resolution_rejected() {
        let parameters: Parameters = serde_json::from_str(r#"{ "fps": 2000 }"#).unwrap();
        assert!(matches!(parameters.validate(), Err(Error::InvalidParameters(_))));

        let parameters = Parameters {
            fps: MAX_FPS,
            ..Parameters::default()
        };
        assert!(parameters.validate().is_ok());
        assert!(parameters.frame_time() > 0.0);
    }

    #[test]
    fn test_huge_radius_rejected() {
        let parameters: Parameters = serde_json::from_str(r#"{ "max_radius": 1e30 }"#).unwrap();
        assert!(matches!(parameters.validate(), Err(Error::InvalidParameters(_))));

        let parameters = Parameters {
            max_radius: 15.0 * 9_000.0,
            ..Parameters::default()
        };
        assert!(parameters.validate().is_ok());
    }
}
