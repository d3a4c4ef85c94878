pub mod allocator;
pub mod financial_year;
pub mod formatter;
