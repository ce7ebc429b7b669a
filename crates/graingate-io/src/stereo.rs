//! Stereo audio buffer for file-level processing.

/// A pair of equal-length channel buffers.
///
/// # Example
///
/// ```rust
/// use graingate_io::StereoSamples;
///
/// let samples = StereoSamples::new(vec![1.0; 4], vec![0.5; 4]);
/// assert_eq!(samples.len(), 4);
/// assert_eq!(samples.to_mono()[0], 0.75);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSamples {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
}

impl StereoSamples {
    /// Create from left and right channels.
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        debug_assert_eq!(left.len(), right.len(), "Channels must have same length");
        Self { left, right }
    }

    /// Create silent buffers of `frames` samples per channel.
    pub fn silence(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Duplicate a mono buffer to both channels.
    pub fn from_mono(mono: Vec<f32>) -> Self {
        Self {
            left: mono.clone(),
            right: mono,
        }
    }

    /// Split interleaved `L, R, L, R, ...` data. A trailing half frame is dropped.
    pub fn from_interleaved(interleaved: &[f32]) -> Self {
        let (left, right) = interleaved
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        Self { left, right }
    }

    /// Interleave into `L, R, L, R, ...`.
    pub fn to_interleaved(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(&l, &r)| [l, r])
            .collect()
    }

    /// Mix down to mono by averaging channels.
    pub fn to_mono(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .map(|(l, r)| (l + r) * 0.5)
            .collect()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Whether the buffers are empty.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Truncate or zero-pad both channels to `frames`.
    ///
    /// ```rust
    /// use graingate_io::StereoSamples;
    ///
    /// let mut key = StereoSamples::from_mono(vec![1.0, 1.0]);
    /// key.fit_to(4);
    /// assert_eq!(key.left, [1.0, 1.0, 0.0, 0.0]);
    /// ```
    pub fn fit_to(&mut self, frames: usize) {
        self.left.resize(frames, 0.0);
        self.right.resize(frames, 0.0);
    }

    /// Largest absolute sample across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Root-mean-square level across both channels (0 when empty).
    pub fn rms(&self) -> f32 {
        let count = self.left.len() + self.right.len();
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .left
            .iter()
            .chain(&self.right)
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();
        (sum / count as f64).sqrt() as f32
    }
}
