pub mod constants;
pub mod context;
pub mod provisioner;
pub mod step;

pub use context::*;
pub use provisioner::*;
pub use step::*;
