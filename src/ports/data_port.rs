//! Price history access port trait.

use crate::domain::error::TrendrankError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for one instrument within `[start_date, end_date]`, ascending.
    fn fetch_bars(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TrendrankError>;

    fn list_instruments(&self) -> Result<Vec<String>, TrendrankError>;
}
