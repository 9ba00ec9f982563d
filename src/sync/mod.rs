pub mod keyed_lock;
