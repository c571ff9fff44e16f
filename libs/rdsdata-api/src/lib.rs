//! Object/row mapping for the RDS Data API.
//!
//! Application values become named wire parameters ([`reader`]), and result
//! rows become application values ([`result`], [`writer`]). Types opt in
//! through a registration table, usually derived:
//!
//! ```ignore
//! #[derive(Mapped, Default)]
//! #[mapping(default)]
//! pub struct User {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! let users: Vec<User> = result_set.map_to_list()?;
//! ```

extern crate self as rdsdata_api;

pub mod convert;
pub mod error;
pub mod options;
pub mod reader;
pub mod resolve;
pub mod result;
pub mod schema;
pub mod value;
pub mod wire;
pub mod writer;

pub use rdsdata_api_derive::{Mapped, WireEnum, mapped_methods};

pub use convert::{FromWire, WireEnum, to_wire};
pub use error::{EmptyResultSetError, MappingError, SingleValueError};
pub use options::MappingOptions;
pub use result::ResultSet;
pub use schema::{Mapped, TypeInfo};
pub use value::{ToValue, Value};
pub use wire::{ColumnMetadata, Row, SqlParameter, TypeHint, WireField, WireValue};
