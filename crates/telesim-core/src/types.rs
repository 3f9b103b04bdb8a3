use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SpaceError;

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f32 vector holding the simulator state for one tick.
///
/// The adapter overwrites the whole vector on every tick; there is no
/// merging. Before the first successful tick it is a zero-filled
/// placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f32>,
}

impl Observation {
    #[must_use]
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl From<Vec<f32>> for Observation {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Continuous control vector sent to the simulator.
///
/// The simulator's signal contract is packed-float only, so there is no
/// discrete variant: every action is a flat f32 vector matching the action
/// space dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f32>,
}

impl Action {
    #[must_use]
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl From<Vec<f32>> for Action {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// BoxSpace
// ---------------------------------------------------------------------------

/// Axis-aligned bounds for observations or actions.
///
/// Built once from the scene's calibration vectors at session start and
/// immutable afterward. Follows Gymnasium `Box` conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    low: Vec<f32>,
    high: Vec<f32>,
}

impl BoxSpace {
    /// Build a space from low/high bound vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DimensionMismatch`] when the vectors differ in
    /// length, and [`SpaceError::Empty`] when both are empty — a scene that
    /// reports zero-dimensional bounds is malformed.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self, SpaceError> {
        if low.len() != high.len() {
            return Err(SpaceError::DimensionMismatch {
                low: low.len(),
                high: high.len(),
            });
        }
        if low.is_empty() {
            return Err(SpaceError::Empty);
        }
        Ok(Self { low, high })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.low.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    #[must_use]
    pub fn low(&self) -> &[f32] {
        &self.low
    }

    #[must_use]
    pub fn high(&self) -> &[f32] {
        &self.high
    }

    /// Whether every element of `values` lies within the bounds.
    ///
    /// A length mismatch is never contained.
    #[must_use]
    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.low.len()
            && values
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }

    /// Clamp `values` element-wise into `[low, high]` in place.
    ///
    /// Elements past the space dimension are left untouched.
    pub fn clip(&self, values: &mut [f32]) {
        for (v, (l, h)) in values.iter_mut().zip(self.low.iter().zip(self.high.iter())) {
            *v = v.clamp(*l, *h);
        }
    }

    /// Return a clipped copy of `action`.
    #[must_use]
    pub fn clipped(&self, action: &Action) -> Action {
        let mut data = action.as_slice().to_vec();
        self.clip(&mut data);
        Action::new(data)
    }

    /// Sample a uniform random point. Takes `&mut impl Rng` for determinism.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Action {
        let data: Vec<f32> = self
            .low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| rng.gen_range(*l..=*h))
            .collect();
        Action::new(data)
    }
}

// ---------------------------------------------------------------------------
// StepResult / StepInfo
// ---------------------------------------------------------------------------

/// Result of `env.step(action)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    /// Terminal-episode indicator reported by the scene.
    pub done: bool,
    pub info: StepInfo,
}

/// Auxiliary per-step data. Empty in the standard flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    pub custom: HashMap<String, f32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Observation ----

    #[test]
    fn observation_new_and_len() {
        let obs = Observation::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(obs.len(), 3);
        assert!(!obs.is_empty());
    }

    #[test]
    fn observation_zeros() {
        let obs = Observation::zeros(4);
        assert_eq!(obs.as_slice(), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn observation_indexing() {
        let obs = Observation::new(vec![10.0, 20.0]);
        assert!((obs[0] - 10.0).abs() < f32::EPSILON);
        assert!((obs[1] - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn observation_from_vec_roundtrip() {
        let obs: Observation = vec![4.0, 5.0].into();
        assert_eq!(obs.into_vec(), vec![4.0, 5.0]);
    }

    #[test]
    fn observation_serialize_roundtrip() {
        let obs = Observation::new(vec![1.0, 2.0, 3.0]);
        let json = serde_json::to_string(&obs).unwrap();
        let obs2: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(obs, obs2);
    }

    // ---- Action ----

    #[test]
    fn action_zeros() {
        let action = Action::zeros(3);
        assert_eq!(action.as_slice(), &[0.0, 0.0, 0.0]);
        assert!(!action.is_empty());
    }

    #[test]
    fn action_mut_slice() {
        let mut action = Action::new(vec![1.0, 2.0]);
        action.as_mut_slice()[0] = 99.0;
        assert!((action.as_slice()[0] - 99.0).abs() < f32::EPSILON);
    }

    // ---- BoxSpace ----

    #[test]
    fn box_space_new_ok() {
        let space = BoxSpace::new(vec![-1.0, -2.0], vec![1.0, 2.0]).unwrap();
        assert_eq!(space.len(), 2);
        assert_eq!(space.low(), &[-1.0, -2.0]);
        assert_eq!(space.high(), &[1.0, 2.0]);
    }

    #[test]
    fn box_space_dimension_mismatch() {
        let err = BoxSpace::new(vec![-1.0], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            SpaceError::DimensionMismatch { low: 1, high: 2 }
        ));
    }

    #[test]
    fn box_space_empty_rejected() {
        let err = BoxSpace::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, SpaceError::Empty));
    }

    #[test]
    fn box_space_contains() {
        let space = BoxSpace::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        assert!(space.contains(&[0.5, 0.5]));
        assert!(space.contains(&[0.0, 1.0]));
        assert!(!space.contains(&[-0.1, 0.5]));
        assert!(!space.contains(&[0.5, 1.1]));
        // wrong dimension
        assert!(!space.contains(&[0.5]));
    }

    #[test]
    fn box_space_clip_in_place() {
        let space = BoxSpace::new(vec![-1.0, -1.0, -1.0], vec![1.0, 1.0, 1.0]).unwrap();
        let mut values = [-2.0, 0.5, 1.5];
        space.clip(&mut values);
        assert_eq!(values, [-1.0, 0.5, 1.0]);
    }

    #[test]
    fn box_space_clipped_copy() {
        let space = BoxSpace::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let action = Action::new(vec![-5.0, 5.0]);
        let clipped = space.clipped(&action);
        assert_eq!(clipped.as_slice(), &[0.0, 1.0]);
        // original untouched
        assert_eq!(action.as_slice(), &[-5.0, 5.0]);
    }

    #[test]
    fn box_space_sample_within_bounds() {
        let space = BoxSpace::new(vec![-1.0, -2.0], vec![1.0, 2.0]).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let action = space.sample(&mut rng);
            assert!(space.contains(action.as_slice()));
        }
    }

    #[test]
    fn box_space_serialize_roundtrip() {
        let space = BoxSpace::new(vec![-1.0], vec![1.0]).unwrap();
        let json = serde_json::to_string(&space).unwrap();
        let space2: BoxSpace = serde_json::from_str(&json).unwrap();
        assert_eq!(space, space2);
    }

    // ---- StepResult ----

    #[test]
    fn step_result_construction() {
        let result = StepResult {
            observation: Observation::new(vec![1.0, 2.0]),
            reward: 1.5,
            done: false,
            info: StepInfo::default(),
        };
        assert!((result.reward - 1.5).abs() < f32::EPSILON);
        assert!(!result.done);
        assert!(result.info.custom.is_empty());
    }

    #[test]
    fn step_result_serialize_roundtrip() {
        let result = StepResult {
            observation: Observation::new(vec![0.5]),
            reward: -0.25,
            done: true,
            info: StepInfo::default(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let result2: StepResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result.observation, result2.observation);
        assert!((result.reward - result2.reward).abs() < f32::EPSILON);
        assert!(result2.done);
    }
}
