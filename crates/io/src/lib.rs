// File I/O: item input, XLSX output, flat previews

pub mod csv;
pub mod items;
pub mod json;
pub mod xlsx;
pub mod xlsx_styles;
