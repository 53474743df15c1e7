//! Baking pipeline behind the `tfpc_bake` binary.

pub mod bake;
pub mod cli;
pub mod inspect;
pub mod preview;
