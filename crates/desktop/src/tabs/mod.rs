pub mod about_tab;
pub mod blind_test_tab;
pub mod settings_tab;
pub mod transform_tab;
