//! Identity handlers.
//!
//! ## Commands
//! - Enforcing (faculty, matricule) uniqueness after a record is created

mod enforce_matricule_uniqueness;

pub use enforce_matricule_uniqueness::{
    EnforceMatriculeUniquenessCommand, EnforceMatriculeUniquenessHandler,
    EnforceMatriculeUniquenessResult,
};
