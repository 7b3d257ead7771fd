//! Domain layer: the status model, invoice identity and the ports the
//! synchronizer and transports are written against.

pub mod invoice;
pub mod ports;
pub mod status;
