pub mod claim;
pub mod ids;
pub mod permission;
