pub mod network;
pub mod spec;

pub use network::{Network, Trace};
pub use spec::{LayerSpec, NetworkSpec};
