// src/handlers/mod.rs

pub mod admin;
pub mod pages;
pub mod questions;
