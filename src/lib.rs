pub mod archive;
pub mod class_name;
pub mod cli;
pub mod config;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod producer;
pub mod walker;

pub use error::{Error, Result};
