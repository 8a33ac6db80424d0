// Supply-chain network: validation, model building and flow extraction

pub mod builder;
pub mod error;
pub mod extract;
pub mod graph;

pub use builder::{FlowModel, FlowModelBuilder, FLOW_UPPER_BOUND};
pub use error::BuildError;
pub use extract::{CostBreakdown, Delivery, FlowPlan, RoastedTotal, Shipment};
pub use graph::{Cafe, EdgeKey, EdgeMap, FlowNetwork, Roastery, Route, Supplier, SupplyChain, Tier};
