mod metric;
mod order;
mod result;

pub use metric::*;
pub use order::*;
pub use result::*;
