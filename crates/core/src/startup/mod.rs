pub mod build_version;
