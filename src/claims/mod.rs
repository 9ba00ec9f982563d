pub mod authorizer;
pub mod engine;
pub mod grants;
pub mod lifecycle;
