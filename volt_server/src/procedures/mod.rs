mod insert;
mod row_count;

pub use insert::Insert;
pub use row_count::RowCount;
