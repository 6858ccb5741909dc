#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod cursor;
pub mod expansion;
pub mod formats;
pub mod logging;
pub mod navigate;
pub mod outline;
pub mod source;
pub mod tree;
pub mod viewer;
