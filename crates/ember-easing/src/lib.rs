//! Easing curves and keyframe interpolation for particle effects.
//!
//! Provides the [`Lerp`] trait, a small set of easing curves, and the
//! keyframe [`Interpolator`] used to map a normalized progress value to
//! an animated quantity (color over lifetime, size over lifetime, ...).
//!
//! # Example
//!
//! ```
//! use ember_easing::Interpolator;
//! use glam::Vec4;
//!
//! let mut colors = Interpolator::new();
//! colors.add_value(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0));
//! colors.add_value(1.0, Vec4::new(0.0, 0.0, 1.0, 1.0));
//!
//! let mid = colors.get_value(0.5);
//! assert!((mid.x - 0.5).abs() < 0.001);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::PI;

use glam::{Vec2, Vec3, Vec4};

// ============================================================================
// Lerp Trait
// ============================================================================

/// Trait for types that support linear interpolation.
///
/// Implement this for custom types to make them usable as keyframe values
/// in an [`Interpolator`].
pub trait Lerp {
    /// Linearly interpolates from `self` to `other` by factor `t`.
    ///
    /// - `t = 0.0` returns `self`
    /// - `t = 1.0` returns `other`
    fn lerp_to(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for f64 {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t as f64
    }
}

impl Lerp for Vec2 {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }
}

impl Lerp for Vec4 {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        Vec4::lerp(*self, *other, t)
    }
}

impl<T: Lerp, const N: usize> Lerp for [T; N] {
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        std::array::from_fn(|i| self[i].lerp_to(&other[i], t))
    }
}

// ============================================================================
// Easing
// ============================================================================

/// Easing curve applied to the local parameter between two keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Easing {
    /// Linear interpolation (no easing).
    #[default]
    Linear,
    /// Quadratic ease in.
    QuadIn,
    /// Quadratic ease out.
    QuadOut,
    /// Quadratic ease in-out.
    QuadInOut,
    /// Cubic ease in.
    CubicIn,
    /// Cubic ease out.
    CubicOut,
    /// Cubic ease in-out.
    CubicInOut,
    /// Sine ease in.
    SineIn,
    /// Sine ease out.
    SineOut,
    /// Sine ease in-out.
    SineInOut,
}

impl Easing {
    /// Evaluates the easing curve at t (0-1).
    pub fn ease(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => 0.5 * (1.0 - (t * PI).cos()),
        }
    }
}

// ============================================================================
// Keyframe Interpolator
// ============================================================================

/// A keyframe pairing a progress value with a value of type `T`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keyframe<T> {
    /// Progress in [0, 1] at which this value applies.
    pub progress: f32,
    /// Value at this progress.
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Creates a new keyframe.
    pub fn new(progress: f32, value: T) -> Self {
        Self { progress, value }
    }
}

/// Maps a progress scalar to an interpolated value via a keyframe table.
///
/// Keyframes are kept sorted by progress, so values may be added in any
/// order. Queries below the first keyframe return the first value, queries
/// above the last return the last value; in between, values are blended
/// linearly (optionally shaped by an [`Easing`] curve).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interpolator<T> {
    keys: Vec<Keyframe<T>>,
    easing: Easing,
}

impl<T> Default for Interpolator<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            easing: Easing::Linear,
        }
    }
}

impl<T: Lerp + Clone + Default> Interpolator<T> {
    /// Creates an empty interpolator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an interpolator from keyframes.
    pub fn from_keyframes(keys: Vec<Keyframe<T>>) -> Self {
        let mut interp = Self {
            keys,
            easing: Easing::Linear,
        };
        interp.sort();
        interp
    }

    /// Sets the easing curve applied between keyframes.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Adds a keyframe and keeps the table sorted.
    pub fn add_value(&mut self, progress: f32, value: T) {
        self.keys.push(Keyframe::new(progress, value));
        self.sort();
    }

    /// Returns the number of keyframes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the table has no keyframes.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the keyframes in progress order.
    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    /// Sorts keyframes by progress.
    fn sort(&mut self) {
        self.keys
            .sort_by(|a, b| a.progress.partial_cmp(&b.progress).unwrap());
    }

    /// Samples the table at the given progress.
    ///
    /// Clamps at both ends: `progress` at or below the first keyframe
    /// returns the first value exactly, at or above the last returns the
    /// last value exactly. An empty table returns `T::default()`.
    pub fn get_value(&self, progress: f32) -> T {
        if self.keys.is_empty() {
            return T::default();
        }

        let first = &self.keys[0];
        if progress <= first.progress {
            return first.value.clone();
        }

        let last = self.keys.last().unwrap();
        if progress >= last.progress {
            return last.value.clone();
        }

        for i in 0..self.keys.len() - 1 {
            let curr = &self.keys[i];
            let next = &self.keys[i + 1];

            if progress >= curr.progress && progress < next.progress {
                let range = next.progress - curr.progress;
                let t = if range > f32::EPSILON {
                    (progress - curr.progress) / range
                } else {
                    0.0
                };
                return curr.value.lerp_to(&next.value, self.easing.ease(t));
            }
        }

        last.value.clone()
    }
}

// ============================================================================
// Palettes
// ============================================================================

/// Preset color tables for common effects.
pub mod palettes {
    use super::Interpolator;
    use glam::Vec4;

    /// The classic fireworks ramp: hot yellow through the spectrum to a
    /// fading red, with alpha burning down over the particle's life.
    pub fn fireworks() -> Interpolator<Vec4> {
        let mut colors = Interpolator::new();
        colors.add_value(0.0, Vec4::new(1.0, 1.0, 0.0, 1.0));
        colors.add_value(0.15, Vec4::new(1.0, 0.0, 1.0, 1.0));
        colors.add_value(0.33, Vec4::new(0.0, 0.0, 1.0, 1.0));
        colors.add_value(0.5, Vec4::new(0.0, 1.0, 1.0, 1.0));
        colors.add_value(0.67, Vec4::new(0.0, 1.0, 0.0, 0.75));
        colors.add_value(0.84, Vec4::new(1.0, 1.0, 0.0, 0.5));
        colors.add_value(1.0, Vec4::new(1.0, 0.0, 0.0, 0.0));
        colors
    }

    /// White-hot spark cooling to transparent orange.
    pub fn sparks() -> Interpolator<Vec4> {
        let mut colors = Interpolator::new();
        colors.add_value(0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        colors.add_value(0.4, Vec4::new(1.0, 0.8, 0.3, 0.9));
        colors.add_value(1.0, Vec4::new(1.0, 0.3, 0.0, 0.0));
        colors
    }
}
