// src/services/mod.rs

pub mod images;
pub mod questions;
pub mod shuffle;
