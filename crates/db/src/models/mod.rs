//! Row models.
//!
//! Each struct mirrors one table and converts into the matching
//! `tenders-core` type. Enum columns are stored as text and parsed on the
//! way out; a value the core does not recognise is a backend failure.

pub mod bid;
pub mod directory;
pub mod tender;

use std::str::FromStr;

use tenders_core::error::CoreError;
use tenders_core::store::StoreError;

/// Parse a text enum column.
pub(crate) fn parse_column<T>(table: &str, column: &str, value: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = CoreError>,
{
    value
        .parse()
        .map_err(|e: CoreError| StoreError::Backend(format!("{table}.{column}: {e}")))
}
