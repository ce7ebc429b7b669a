//! Closed-form grain windows.
//!
//! Each window maps a normalized phase `p` in `[0, 1]` to a gain:
//!
//! | Window | Gain |
//! |--------|------|
//! | Hann | `0.5 * (1 - cos(2πp))` |
//! | Triangle | `1 - abs(2p - 1)` |
//! | Blackman | `0.42 - 0.5 cos(2πp) + 0.08 cos(4πp)` |
//! | Rectangular | `1` |
//! | Exponential | `exp(-4 (1 - p))` |

use core::f32::consts::TAU;
use core::str::FromStr;

use graingate_core::ParseError;
use libm::{cosf, expf};

/// Fixed window shapes a grain can be rendered with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// Raised cosine, zero at both ends.
    #[default]
    Hann,
    /// Linear rise and fall.
    Triangle,
    /// Three-term Blackman, lower sidelobes than Hann.
    Blackman,
    /// Constant unity gain.
    Rectangular,
    /// Exponential swell toward the end of the grain.
    Exponential,
}

impl WindowKind {
    /// All window kinds in display order.
    pub const ALL: [WindowKind; 5] = [
        WindowKind::Hann,
        WindowKind::Triangle,
        WindowKind::Blackman,
        WindowKind::Rectangular,
        WindowKind::Exponential,
    ];

    /// Lower-case name, also accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            WindowKind::Hann => "hann",
            WindowKind::Triangle => "triangle",
            WindowKind::Blackman => "blackman",
            WindowKind::Rectangular => "rectangular",
            WindowKind::Exponential => "exponential",
        }
    }

    /// Gain at normalized phase `phase` in `[0, 1]`.
    ///
    /// ```rust
    /// use graingate_engine::WindowKind;
    ///
    /// assert!(WindowKind::Hann.gain(0.0).abs() < 1e-6);
    /// assert!((WindowKind::Hann.gain(0.5) - 1.0).abs() < 1e-6);
    /// assert_eq!(WindowKind::Rectangular.gain(0.3), 1.0);
    /// ```
    #[inline]
    pub fn gain(self, phase: f32) -> f32 {
        match self {
            WindowKind::Hann => 0.5 * (1.0 - cosf(TAU * phase)),
            WindowKind::Triangle => 1.0 - (2.0 * phase - 1.0).abs(),
            WindowKind::Blackman => 0.42 - 0.5 * cosf(TAU * phase) + 0.08 * cosf(2.0 * TAU * phase),
            WindowKind::Rectangular => 1.0,
            WindowKind::Exponential => expf(-4.0 * (1.0 - phase)),
        }
    }

    /// Gain at sample `index` of a grain `length` samples long.
    ///
    /// The phase is `index / (length - 1)`, so the first and last samples
    /// land exactly on the window ends. A one-sample grain is evaluated at
    /// the window centre.
    #[inline]
    pub fn evaluate(self, index: u32, length: u32) -> f32 {
        debug_assert!(index < length.max(1));
        let phase = if length > 1 {
            index as f32 / (length - 1) as f32
        } else {
            0.5
        };
        self.gain(phase)
    }
}

/// Extra spellings accepted by [`FromStr`].
const ALIASES: [(&str, WindowKind); 5] = [
    ("hanning", WindowKind::Hann),
    ("tri", WindowKind::Triangle),
    ("rect", WindowKind::Rectangular),
    ("flat", WindowKind::Rectangular),
    ("exp", WindowKind::Exponential),
];

impl FromStr for WindowKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        WindowKind::ALL
            .into_iter()
            .map(|kind| (kind.name(), kind))
            .chain(ALIASES)
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, kind)| kind)
            .ok_or(ParseError::UnknownShape)
    }
}
