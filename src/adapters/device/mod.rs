//! Device gateway adapters.

mod queue_gateway;

pub use queue_gateway::QueueDeviceGateway;
