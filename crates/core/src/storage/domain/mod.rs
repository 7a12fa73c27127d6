pub mod credentials;
pub mod key_value_store;
