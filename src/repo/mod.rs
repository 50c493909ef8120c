//! Repositories over the journal stores
//!
//! Thin, behavior-carrying layers between the facade and the storage engine:
//! seeds (lifecycle, comments, history) and branches (membership bookkeeping).

pub mod branches;
pub mod seeds;

pub use branches::BranchRepository;
pub use seeds::SeedRepository;
