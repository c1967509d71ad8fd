pub mod entry;
pub mod identity;
pub mod mood;
