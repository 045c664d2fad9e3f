//! Forbidden movement direction and the boundary line derived from it.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Direction an object must not move in once past the boundary line.
///
/// Pixel convention: x grows rightward, y grows downward. `Up` and `Down`
/// follow the same polarity as `Right` and `Left` on the y axis, so `Up`
/// fires on increasing y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Direction {
    #[default]
    Right,
    Left,
    Up,
    Down,
}

/// Coordinate axis a direction is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub fn of_point(self, point: &Point2<f32>) -> f32 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }

    #[inline]
    pub fn of_vector(self, vector: &Vector2<f32>) -> f32 {
        match self {
            Axis::X => vector.x,
            Axis::Y => vector.y,
        }
    }
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Up,
        Direction::Down,
    ];

    /// Axis the direction moves along.
    pub fn axis(self) -> Axis {
        match self {
            Direction::Right | Direction::Left => Axis::X,
            Direction::Up | Direction::Down => Axis::Y,
        }
    }

    /// True when a violation means the coordinate is growing past the line.
    pub fn is_increasing(self) -> bool {
        matches!(self, Direction::Right | Direction::Up)
    }

    /// Lowercase name, as accepted by `from_str`.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::Left => "left",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDirection(s.to_string()))
    }
}

impl TryFrom<String> for Direction {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.as_str().to_string()
    }
}

/// Scalar threshold a centroid must reach along the direction's axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryLine {
    direction: Direction,
    position: f32,
}

impl BoundaryLine {
    /// Place the line `frame_size / ratio` in from the edge the object is
    /// heading towards. Truncated to whole pixels.
    pub fn new(direction: Direction, frame_size: u32, ratio: u32) -> Result<Self, ConfigError> {
        if frame_size == 0 {
            return Err(ConfigError::ZeroFrameSize);
        }
        if ratio < 2 {
            return Err(ConfigError::RatioTooSmall(ratio));
        }

        let f = f64::from(frame_size);
        let r = f64::from(ratio);
        let position = if direction.is_increasing() {
            f - f / r
        } else {
            f - f * (r - 1.0) / r
        };

        Ok(Self {
            direction,
            position: position.trunc() as f32,
        })
    }

    /// A line at an explicit pixel position.
    pub fn at(direction: Direction, position: f32) -> Self {
        Self {
            direction,
            position,
        }
    }

    /// Get the forbidden direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Line position along the axis, in whole pixels.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Whether `point` is on or past the line on the forbidden side.
    pub fn is_crossed_by(&self, point: &Point2<f32>) -> bool {
        let coord = self.direction.axis().of_point(point);
        if self.direction.is_increasing() {
            coord >= self.position
        } else {
            coord <= self.position
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_positions() {
        let cases = [
            (Direction::Right, 2, 240.0),
            (Direction::Left, 2, 240.0),
            (Direction::Right, 4, 360.0),
            (Direction::Left, 4, 120.0),
            (Direction::Up, 4, 360.0),
            (Direction::Down, 4, 120.0),
        ];
        for (direction, ratio, expected) in cases {
            let line = BoundaryLine::new(direction, 480, ratio).unwrap();
            assert_eq!(line.position(), expected, "{direction} ratio {ratio}");
        }
    }

    #[test]
    fn test_boundary_truncates() {
        // 500 - 500/3 = 333.33..
        let line = BoundaryLine::new(Direction::Right, 500, 3).unwrap();
        assert_eq!(line.position(), 333.0);
        // 500 - 500*2/3 = 166.66..
        let line = BoundaryLine::new(Direction::Left, 500, 3).unwrap();
        assert_eq!(line.position(), 166.0);
    }

    #[test]
    fn test_boundary_rejects_bad_input() {
        assert!(matches!(
            BoundaryLine::new(Direction::Right, 480, 1),
            Err(ConfigError::RatioTooSmall(1))
        ));
        assert!(matches!(
            BoundaryLine::new(Direction::Right, 0, 2),
            Err(ConfigError::ZeroFrameSize)
        ));
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("right".parse::<Direction>().unwrap(), Direction::Right);
        assert_eq!(" Down ".parse::<Direction>().unwrap(), Direction::Down);
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDirection(ref s) if s == "sideways"));
    }

    #[test]
    fn test_axis_and_polarity() {
        assert_eq!(Direction::Right.axis(), Axis::X);
        assert_eq!(Direction::Left.axis(), Axis::X);
        assert_eq!(Direction::Up.axis(), Axis::Y);
        assert_eq!(Direction::Down.axis(), Axis::Y);
        assert!(Direction::Up.is_increasing());
        assert!(!Direction::Down.is_increasing());
    }

    #[test]
    fn test_crossing_side() {
        let up = BoundaryLine::at(Direction::Up, 100.0);
        assert!(up.is_crossed_by(&Point2::new(0.0, 100.0)));
        assert!(!up.is_crossed_by(&Point2::new(500.0, 99.0)));

        let left = BoundaryLine::at(Direction::Left, 100.0);
        assert!(left.is_crossed_by(&Point2::new(100.0, 0.0)));
        assert!(!left.is_crossed_by(&Point2::new(101.0, 0.0)));
    }
}
