pub mod directory;
pub mod role_resolver;
