// Re-export the XSD value types used for parsing and printing literal values.
pub use oxsdatatypes::{
    Boolean, Date, DateTime, Decimal, Double, Float, GDay, GMonth, GMonthDay, GYear, GYearMonth,
    Integer, Time,
};
