pub mod candidates;
pub mod interview;
pub mod profile;
