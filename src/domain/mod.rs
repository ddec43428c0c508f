// Domain layer: step outcomes, command descriptions and the ports steps talk through.

pub mod model;
pub mod ports;
