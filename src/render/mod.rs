//! Summary assembly: still grids, animated grids and per-subject animations.

pub mod assembler;
pub mod output;
