pub mod asterism;
pub mod consts;
pub mod error;
pub mod flat;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod register;
pub mod solver;
pub mod stack;
