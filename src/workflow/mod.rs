pub mod assembly_flow;
pub mod unit_ctx;

pub use assembly_flow::{unit_rng, AssemblyFlow, MockSummary, UnitReport};
pub use unit_ctx::{AssemblyUnit, UnitKind};
