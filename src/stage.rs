//! Positioning stage seam
//!
//! The core never talks to hardware. Anything that can report a position,
//! home and move implements [`PositioningStage`]; axis limits are layered on
//! top with [`LimitedStage`], and [`SimulatedStage`] stands in for a printer
//! when running offline or in tests.

use crate::sequence::{VisitStep, WellSequence};
use crate::types::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("{axis} target {value} is outside limits [{min}, {max}]")]
    OutOfLimits {
        axis: Axis,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Motion failed: {0}")]
    Motion(String),
}

/// Per-axis move target. `None` leaves that axis where it is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisTarget {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl AxisTarget {
    pub fn xyz(point: Point3) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
            z: Some(point.z),
        }
    }

    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }

    pub fn with_z(mut self, z: Option<f64>) -> Self {
        self.z = z;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    pub fn axes(&self) -> [(Axis, Option<f64>); 3] {
        [(Axis::X, self.x), (Axis::Y, self.y), (Axis::Z, self.z)]
    }

    /// Absolute position this target reaches from `current`.
    pub fn resolve_absolute(&self, current: Point3) -> Point3 {
        Point3::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
        )
    }

    /// The absolute target a relative move of `self` reaches from `current`,
    /// keeping untouched axes as `None`.
    pub fn offset_from(&self, current: Point3) -> AxisTarget {
        AxisTarget {
            x: self.x.map(|dx| current.x + dx),
            y: self.y.map(|dy| current.y + dy),
            z: self.z.map(|dz| current.z + dz),
        }
    }
}

/// Inclusive range for one axis, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Travel limits for all three axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitPolicy {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl Default for LimitPolicy {
    /// Limits of the Monoprice printer the rig was built on.
    fn default() -> Self {
        Self {
            x: AxisRange::new(0.0, 200.0),
            y: AxisRange::new(80.0, 150.0),
            z: AxisRange::new(95.0, 170.0),
        }
    }
}

impl LimitPolicy {
    pub fn range(&self, axis: Axis) -> AxisRange {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Check an absolute target. Axes left as `None` are not checked.
    pub fn check(&self, target: &AxisTarget) -> Result<(), StageError> {
        for (axis, value) in target.axes() {
            let Some(value) = value else { continue };
            let range = self.range(axis);
            if !range.contains(value) {
                return Err(StageError::OutOfLimits {
                    axis,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }

    pub fn check_point(&self, point: Point3) -> Result<(), StageError> {
        self.check(&AxisTarget::xyz(point))
    }
}

/// Anything that can be homed and moved in machine coordinates.
///
/// `speed` is a feedrate in mm/min; `None` uses the stage's current one.
pub trait PositioningStage {
    fn position(&mut self) -> Result<Point3, StageError>;

    fn home(&mut self) -> Result<(), StageError>;

    fn move_absolute(&mut self, target: AxisTarget, speed: Option<f64>)
        -> Result<(), StageError>;

    fn move_relative(&mut self, delta: AxisTarget, speed: Option<f64>)
        -> Result<(), StageError>;
}

impl<S: PositioningStage + ?Sized> PositioningStage for &mut S {
    fn position(&mut self) -> Result<Point3, StageError> {
        (**self).position()
    }

    fn home(&mut self) -> Result<(), StageError> {
        (**self).home()
    }

    fn move_absolute(&mut self, target: AxisTarget, speed: Option<f64>) -> Result<(), StageError> {
        (**self).move_absolute(target, speed)
    }

    fn move_relative(&mut self, delta: AxisTarget, speed: Option<f64>) -> Result<(), StageError> {
        (**self).move_relative(delta, speed)
    }
}

/// Rejects moves that would leave `policy` before they reach the inner stage.
#[derive(Debug)]
pub struct LimitedStage<S> {
    inner: S,
    policy: LimitPolicy,
}

impl<S: PositioningStage> LimitedStage<S> {
    pub fn new(inner: S, policy: LimitPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &LimitPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: PositioningStage> PositioningStage for LimitedStage<S> {
    fn position(&mut self) -> Result<Point3, StageError> {
        self.inner.position()
    }

    fn home(&mut self) -> Result<(), StageError> {
        self.inner.home()
    }

    fn move_absolute(&mut self, target: AxisTarget, speed: Option<f64>) -> Result<(), StageError> {
        if let Err(e) = self.policy.check(&target) {
            log::warn!("Refusing absolute move to {:?}: {}", target, e);
            return Err(e);
        }
        self.inner.move_absolute(target, speed)
    }

    fn move_relative(&mut self, delta: AxisTarget, speed: Option<f64>) -> Result<(), StageError> {
        let current = self.inner.position()?;
        let reached = delta.offset_from(current);
        if let Err(e) = self.policy.check(&reached) {
            log::warn!("Refusing relative move {:?} from {}: {}", delta, current, e);
            return Err(e);
        }
        self.inner.move_relative(delta, speed)
    }
}

/// In-memory stage. Moves complete instantly and are recorded.
#[derive(Debug, Clone, Default)]
pub struct SimulatedStage {
    position: Point3,
    home_position: Point3,
    feedrate: Option<f64>,
    history: Vec<Point3>,
}

impl SimulatedStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stage that homes to `home` and starts there.
    pub fn with_home(home: Point3) -> Self {
        Self {
            position: home,
            home_position: home,
            ..Self::default()
        }
    }

    /// Every position reached by a move or home, in order.
    pub fn history(&self) -> &[Point3] {
        &self.history
    }

    pub fn feedrate(&self) -> Option<f64> {
        self.feedrate
    }

    fn arrive(&mut self, point: Point3, speed: Option<f64>) -> Result<(), StageError> {
        if !point.is_finite() {
            return Err(StageError::Motion(format!(
                "target {:?} is not a finite position",
                point
            )));
        }
        if speed.is_some() {
            self.feedrate = speed;
        }
        self.position = point;
        self.history.push(point);
        Ok(())
    }
}

impl PositioningStage for SimulatedStage {
    fn position(&mut self) -> Result<Point3, StageError> {
        Ok(self.position)
    }

    fn home(&mut self) -> Result<(), StageError> {
        log::debug!("Simulated stage homing to {}", self.home_position);
        self.arrive(self.home_position, None)
    }

    fn move_absolute(&mut self, target: AxisTarget, speed: Option<f64>) -> Result<(), StageError> {
        let point = target.resolve_absolute(self.position);
        self.arrive(point, speed)
    }

    fn move_relative(&mut self, delta: AxisTarget, speed: Option<f64>) -> Result<(), StageError> {
        let point = delta.offset_from(self.position).resolve_absolute(self.position);
        self.arrive(point, speed)
    }
}

/// Move through `sequence` in order at the sequence's Z, calling
/// `on_arrival` after each well is reached.
///
/// Stops at the first failed move or callback error and returns it; wells
/// already visited stay visited. Returns the number of wells reached.
pub fn traverse<S, F, E>(
    stage: &mut S,
    sequence: &WellSequence,
    speed: Option<f64>,
    mut on_arrival: F,
) -> Result<usize, E>
where
    S: PositioningStage + ?Sized,
    F: FnMut(usize, &VisitStep) -> Result<(), E>,
    E: From<StageError>,
{
    log::info!(
        "Traversing {} wells ({}) at Z {:?}",
        sequence.len(),
        sequence.pattern,
        sequence.z
    );
    for (i, step) in sequence.steps.iter().enumerate() {
        let target = AxisTarget::xy(step.x(), step.y()).with_z(sequence.z);
        stage.move_absolute(target, speed)?;
        log::debug!("Reached well {} ({}/{})", step.label, i + 1, sequence.len());
        on_arrival(i, step)?;
    }
    Ok(sequence.len())
}
