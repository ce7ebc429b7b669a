//! Parameter introspection for discoverable gate settings.
//!
//! [`ParameterInfo`] lets a host, a controller mapping, or the CLI walk a
//! processor's settings by index, read their metadata from a
//! [`ParamDescriptor`], and set values that are clamped on entry.
//!
//! Each descriptor carries:
//!
//! - [`ParamId`] - stable numeric ID that survives reordering
//! - [`ParamScale`] - normalization curve (linear or logarithmic)
//! - [`ParamFlags`] - capability flags (automatable, stepped, ...)
//! - `string_id` - human-readable stable ID, also used as the settings-file key
//!
//! # Example
//!
//! ```rust
//! use graingate_core::{ParameterInfo, ParamDescriptor, ParamId};
//!
//! struct Threshold {
//!     db: f32,
//! }
//!
//! impl ParameterInfo for Threshold {
//!     fn param_count(&self) -> usize { 1 }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         match index {
//!             0 => Some(ParamDescriptor::gain_db("Threshold", "Thresh", -80.0, 0.0, -40.0)
//!                 .with_id(ParamId(100), "threshold")),
//!             _ => None,
//!         }
//!     }
//!
//!     fn get_param(&self, index: usize) -> f32 {
//!         if index == 0 { self.db } else { 0.0 }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f32) {
//!         if let Some(desc) = self.param_info(index) {
//!             self.db = desc.clamp(value);
//!         }
//!     }
//! }
//!
//! let mut t = Threshold { db: -40.0 };
//! let idx = t.find_param_by_name("thresh").unwrap();
//! t.set_param(idx, -120.0);
//! assert_eq!(t.get_param(idx), -80.0);
//! ```

/// Scaling curve for parameter normalization.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// More resolution at low values. Requires `min > 0.0`.
    Logarithmic,
}

/// Stable parameter identifier that survives reordering.
///
/// Once assigned, a `ParamId` must never change for a given parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Parameter capability flags. Use [`union`](Self::union) to combine.
///
/// ```rust
/// use graingate_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!ParamFlags::NONE.contains(ParamFlags::AUTOMATABLE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (choice or toggle).
    pub const STEPPED: Self = Self(1 << 1);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Trait for processors that expose introspectable parameters.
///
/// Indices are zero-based and stable for the lifetime of the instance.
pub trait ParameterInfo {
    /// Number of parameters. Valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Descriptor for the parameter at `index`, or `None` if out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current plain value. Out-of-range indices return `0.0`.
    fn get_param(&self, index: usize) -> f32;

    /// Set a plain value, clamped to the descriptor range. Out-of-range
    /// indices are ignored.
    fn set_param(&mut self, index: usize, value: f32);

    /// Find a parameter index by name, short name, or string id
    /// (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        for i in 0..self.param_count() {
            if let Some(desc) = self.param_info(i)
                && (desc.name.eq_ignore_ascii_case(name)
                    || desc.short_name.eq_ignore_ascii_case(name)
                    || desc.string_id.eq_ignore_ascii_case(name))
            {
                return Some(i);
            }
        }
        None
    }

    /// Stable [`ParamId`] for the parameter at `index`.
    fn param_id(&self, index: usize) -> Option<ParamId> {
        self.param_info(index).map(|d| d.id)
    }

    /// Find a parameter index by its stable [`ParamId`]. O(n), for setup paths.
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}

/// Metadata for a single parameter.
///
/// `short_name` should be 8 characters or less for hardware displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display.
    pub name: &'static str,
    /// Short name, max 8 characters.
    pub short_name: &'static str,
    /// Unit type for formatting the value.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Value used on construction and reset.
    pub default: f32,
    /// Recommended increment for encoder-based control.
    pub step: f32,
    /// Stable numeric ID. `ParamId(0)` means unassigned.
    pub id: ParamId,
    /// Stable string ID, e.g. `"grain_ms"`.
    pub string_id: &'static str,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    const fn base(name: &'static str, short_name: &'static str, unit: ParamUnit) -> Self {
        Self {
            name,
            short_name,
            unit,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            step: 0.01,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
        }
    }

    /// Time parameter in milliseconds.
    pub const fn time_ms(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        let mut desc = Self::base(name, short_name, ParamUnit::Milliseconds);
        desc.min = min;
        desc.max = max;
        desc.default = default;
        desc.step = 0.5;
        desc
    }

    /// Level parameter in decibels.
    pub const fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        let mut desc = Self::base(name, short_name, ParamUnit::Decibels);
        desc.min = min;
        desc.max = max;
        desc.default = default;
        desc.step = 0.5;
        desc
    }

    /// Continuous amount in `[0, 1]`.
    pub const fn amount(name: &'static str, short_name: &'static str, default: f32) -> Self {
        let mut desc = Self::base(name, short_name, ParamUnit::Amount);
        desc.default = default;
        desc
    }

    /// On/off switch stored as `0.0` / `1.0`.
    pub const fn toggle(name: &'static str, short_name: &'static str, default: bool) -> Self {
        let mut desc = Self::base(name, short_name, ParamUnit::Toggle);
        desc.default = if default { 1.0 } else { 0.0 };
        desc.step = 1.0;
        desc.flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
        desc
    }

    /// Choice among `count` options, stored as the index.
    pub const fn choice(
        name: &'static str,
        short_name: &'static str,
        count: usize,
        default: usize,
    ) -> Self {
        let mut desc = Self::base(name, short_name, ParamUnit::Choice);
        desc.max = (count.saturating_sub(1)) as f32;
        desc.default = default as f32;
        desc.step = 1.0;
        desc.flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
        desc
    }

    /// Set the stable numeric and string IDs.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Set the normalization curve.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Clamp a value to `[min, max]`. NaN maps to the default. Stepped
    /// parameters are rounded to the nearest step.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let value = if self.flags.contains(ParamFlags::STEPPED) {
            libm::roundf(value)
        } else {
            value
        };
        value.clamp(self.min, self.max)
    }

    /// Map a plain value to `[0, 1]`.
    ///
    /// ```rust
    /// use graingate_core::ParamDescriptor;
    ///
    /// let t = ParamDescriptor::gain_db("Threshold", "Thresh", -80.0, 0.0, -40.0);
    /// assert!((t.normalize(-40.0) - 0.5).abs() < 1e-6);
    /// ```
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (self.clamp(value) - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(self.clamp(value) / self.min) / libm::logf(self.max / self.min)
            }
        }
    }
}

/// Unit attached to a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels
    Decibels,
    /// Milliseconds
    Milliseconds,
    /// Unitless amount in `[0, 1]`
    Amount,
    /// Boolean switch
    Toggle,
    /// Index into a list of options
    Choice,
}

impl ParamUnit {
    /// Display suffix for the unit.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Amount | ParamUnit::Toggle | ParamUnit::Choice => "",
        }
    }
}
