pub mod hash;
pub mod logging;
