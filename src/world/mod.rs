pub mod border;
pub mod partition_index;
pub mod position;
