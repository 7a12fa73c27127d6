pub mod key_check_worker;
pub mod recording_worker;
pub mod transform_worker;
