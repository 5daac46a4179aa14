pub mod extensions;
pub mod query;
