//! fiona-emu library
//!
//! Functional model of the FIONA vector/matrix RoCC coprocessor.

pub mod backend;
pub mod config;
pub mod device;
pub mod ffi;
pub mod interpreter;
