//! Indicator evaluation and aggregation.
//!
//! This module normalizes raw spreadsheet rows into indicator records,
//! resolves each indicator's polarity, checks goals, and groups the results
//! by reference period and by indicator series.

pub mod aggregate;
pub mod analyzer;
pub mod evaluate;
pub mod filters;
pub mod normalize;
pub mod period;
pub mod polarity;
pub mod types;
pub mod utility;
