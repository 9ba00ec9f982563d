pub mod grant_store;
#[cfg(test)]
pub(crate) mod offline;
pub mod repository;
pub mod store;
