// Domain layer: gate pass models and ports (storage, clock). No storage details here.

pub mod model;
pub mod ports;
