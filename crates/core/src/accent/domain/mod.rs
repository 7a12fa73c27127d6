pub mod accent_catalog;
