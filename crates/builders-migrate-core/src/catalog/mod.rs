//! Catalog inspection of the target table.

pub mod inspector;
pub mod table;

pub use inspector::{Inspection, SchemaInspector};
pub use table::{quote_ident, ColumnInfo, TableDescriptor, TableRef};
