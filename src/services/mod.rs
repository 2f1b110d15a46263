pub mod breakdown;
pub mod participation;
