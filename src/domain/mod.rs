// Domain layer: request model and the image source port. No storage or config details here.

pub mod model;
pub mod ports;
