// Adapters layer: concrete implementations of the domain ports for a real machine.

pub mod system;

pub use system::SystemHost;
