//! Core allocation logic

pub mod allocator;
pub mod component;
pub mod config;
pub mod context;
pub mod engine;
pub mod patterns;
pub mod scorer;
