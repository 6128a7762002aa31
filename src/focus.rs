use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::emitter::{Emitter, Position, TWO_PI};
use crate::error::{Error, Result};

const QUESTION: &str =
    "Give the x,y coordinates of where you want the beam to be focused in the format 'x,y' ";

/// The point every emitter's wavefront is timed to reach in phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocalPoint {
    pub x: i32,
    pub y: i32,
}

impl FocalPoint {
    pub fn position(&self) -> Position {
        Position::new(self.x as f32, self.y as f32)
    }
}

impl FromStr for FocalPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let line = s.trim_end_matches(|c| c == '\n' || c == '\r');
        let invalid = || Error::InvalidFocus(line.to_string());

        let mut parts = line.split(',');
        let (x, y) = match (parts.next(), parts.next(), parts.next()) {
            (Some(x), Some(y), None) => (x, y),
            _ => return Err(invalid()),
        };

        Ok(FocalPoint {
            x: x.trim().parse().map_err(|_| invalid())?,
            y: y.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for FocalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} , {}", self.x, self.y)
    }
}

/// Asks for the focal point on `output` and parses one line of `input`.
pub fn prompt<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<FocalPoint> {
    write!(output, "{}", QUESTION)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    line.parse()
}

/// Phase lead that makes `emitter`'s wavefront arrive at `focus` in step with
/// the rest of the array: the distance to the focus measured in radians of
/// the emitter's wavelength.
pub fn phase_from_focus(focus: &Position, emitter: &Emitter) -> f32 {
    emitter.position().distance(focus) * (TWO_PI / emitter.wavelength())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::wrap;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_focus() {
        assert_eq!("50,0".parse::<FocalPoint>().unwrap(), FocalPoint { x: 50, y: 0 });
        assert_eq!("-12,7\n".parse::<FocalPoint>().unwrap(), FocalPoint { x: -12, y: 7 });
        assert_eq!(" 3, 4".parse::<FocalPoint>().unwrap(), FocalPoint { x: 3, y: 4 });
    }

    #[test]
    fn test_parse_focus_rejects_malformed() {
        for input in &["abc", "", "1", "1,", ",2", "1,2,3", "1.5,2", "x,y", "1;2"] {
            match input.parse::<FocalPoint>() {
                Err(Error::InvalidFocus(_)) => {}
                other => panic!("{:?} parsed as {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_invalid_focus_message() {
        let err = "abc".parse::<FocalPoint>().unwrap_err();
        assert!(err.to_string().contains("'x,y'"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_prompt_reads_one_line() {
        let mut output = Vec::new();
        let focus = prompt(&b"10,-20\nignored\n"[..], &mut output).unwrap();
        assert_eq!(focus, FocalPoint { x: 10, y: -20 });
        assert_eq!(String::from_utf8(output).unwrap(), QUESTION);
    }

    #[test]
    fn test_prompt_fails_fast() {
        let result = prompt(&b"abc\n"[..], Vec::new());
        assert!(matches!(result, Err(Error::InvalidFocus(_))));
    }

    #[test]
    fn test_phase_at_focus_is_zero() {
        let e = Emitter::new(Position::default(), 3.0, 0.2, 0.0, 100.0, 0.6).unwrap();
        assert_eq!(phase_from_focus(&Position::default(), &e), 0.0);
    }

    #[test]
    fn test_phase_from_distant_focus() {
        let mut e = Emitter::new(Position::new(-1.0, 0.0), 3.0, 0.2, 0.0, 100.0, 0.6).unwrap();
        let phase = phase_from_focus(&Position::new(50.0, 0.0), &e);
        assert_relative_eq!(phase, 51.0 * (TWO_PI / e.wavelength()));

        e.set_phase(phase);
        assert_relative_eq!(e.phase(), wrap(51.0 * (TWO_PI / 15.0), TWO_PI), epsilon = 1e-4);
        assert_relative_eq!(e.phase(), 0.8 * std::f32::consts::PI, epsilon = 1e-4);
    }
}
