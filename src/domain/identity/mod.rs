//! Identity domain module.
//!
//! Student identity records and the (faculty, matricule) uniqueness key.

mod student_profile;

pub use student_profile::{MatriculeKey, StudentProfile};
