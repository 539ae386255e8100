#![no_std]

pub mod builder;
pub mod context;
pub mod error;
pub mod frame;
pub mod opcode;
pub mod plum;
pub mod utils;

mod timer;

pub use builder::Builder;
pub use context::Context;
pub use error::Error;
pub use frame::{Frame, FrameView, HEIGHT, WIDTH};
pub use opcode::OpCode;
pub use plum::{Plum8, State, DEFAULT_CLOCK_HZ};

pub use nb;
