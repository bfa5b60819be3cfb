pub mod dedup;
pub mod estimator;
pub mod packer;
pub mod partition;
pub mod tiers;

pub use dedup::dedupe;
pub use estimator::{Estimator, WeightClass};
pub use packer::{PackParams, Packer, QuestionPool, Selection};
pub use partition::{group_by_section, partition, Rejection, SectionGrouping, ThemeEligibility};
pub use tiers::{nearest_tier, TierSet};
