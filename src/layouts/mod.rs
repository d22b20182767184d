pub mod column_major;
pub mod row_major;
