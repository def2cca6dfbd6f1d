//! Rank data input port trait.

use crate::domain::error::TrendrankError;
use crate::domain::rank_snapshot::RankRow;

pub trait RankPort {
    /// Every usable rank row from the source. Rows that cannot be coerced are
    /// dropped; an input with no usable rows is an error.
    fn load_rank_rows(&self) -> Result<Vec<RankRow>, TrendrankError>;
}
