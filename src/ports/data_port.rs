//! Data access port trait.

use crate::domain::error::VixpeError;
use crate::domain::series::RawSeries;

/// Source of the raw observation table.
pub trait DataPort {
    fn load_series(&self) -> Result<RawSeries, VixpeError>;
}
