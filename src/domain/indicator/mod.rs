//! Factor building blocks for the trend score.
//!
//! Every function here works on a trailing window of optional values ending at
//! the as-of row and returns `None` when the value is undefined (short window,
//! missing sample, division by zero). Callers drop the instrument instead of
//! propagating NaN.

pub mod atr;
pub mod momentum;
pub mod rank;
pub mod sma;

pub use atr::average_true_range;
pub use momentum::momentum;
pub use rank::percentile_ranks;
pub use sma::{sma, sma_structure};
