pub mod comparison;
pub mod transform_session;
