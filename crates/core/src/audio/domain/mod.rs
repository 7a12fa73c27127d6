pub mod transform_error;
pub mod voice_transformer;
