pub mod config;
pub mod consts;
pub mod error;
pub mod frame;
pub mod io;
pub mod measure;
pub mod source;
pub mod transform;
pub mod viewer;
