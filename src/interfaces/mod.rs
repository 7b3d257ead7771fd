//! Presentation side: how a status looks, and a sink that prints it.

pub mod terminal;
pub mod view;
