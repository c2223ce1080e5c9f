//! normscore-core
//!
//! Pure domain types shared by the scoring engine and its callers:
//! questions, response scales, raw responses and respondent demographics.
//! No scoring logic and no I/O live here.

pub mod error;
pub mod models;
