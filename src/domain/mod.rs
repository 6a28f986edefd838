// Domain layer: request/response models, ports (interfaces) and pure naming rules.
// No HTTP or filesystem access lives here.

pub mod model;
pub mod ports;

pub mod services;
