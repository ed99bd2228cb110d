use thiserror::Error;

/// Errors reported when a [`UintSet`](crate::UintSet) is constructed with
/// parameters it cannot honor.
///
/// Once a set exists, none of its operations can fail: every `u64` is a
/// valid key, including the reserved empty-slot value.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// The fill factor was not strictly between 0 and 1.
    #[error("fill factor must be in (0, 1), got {0}")]
    InvalidFillFactor(f64),

    /// The size hint was zero.
    #[error("size hint must be positive")]
    InvalidSizeHint,

    /// The slot count needed for the size hint does not fit in `usize`.
    #[error("capacity overflow")]
    CapacityOverflow,
}
