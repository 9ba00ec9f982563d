pub mod override_state;
