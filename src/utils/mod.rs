// src/utils/mod.rs

pub mod gate;
