#![cfg_attr(not(test), no_std)]
//! Board-agnostic render, touch and power pipeline of the AMOLED watch
//!
//! Everything in here runs on the host as well, the firmware crate only
//! plugs in the esp-hal peripherals and the slint window.

extern crate alloc;

pub mod config;
pub mod flush;
pub mod frame_pool;
pub mod geometry;
pub mod pixel;
pub mod power;
pub mod rotation;
pub mod scheduler;
pub mod tick;
pub mod touch;
