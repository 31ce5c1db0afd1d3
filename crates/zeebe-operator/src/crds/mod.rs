pub mod common;
pub mod zeebe;

pub use common::{BackendSpec, Condition};
pub use zeebe::{BrokerSpec, GatewaySpec, PartitionsSpec, Zeebe, ZeebeSpec, ZeebeStatus};
