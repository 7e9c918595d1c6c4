// src/models/mod.rs

pub mod medicine;
pub mod sale;
pub mod stock;

pub use medicine::*;
pub use sale::*;
pub use stock::*;
