//! Core data model: services, pid files and process trees

pub mod models;
pub mod pid_file;
pub mod process_tree;
