pub mod indicator;
pub mod price;
pub mod report;
pub mod signal;

pub use indicator::*;
pub use price::*;
pub use report::*;
pub use signal::*;
