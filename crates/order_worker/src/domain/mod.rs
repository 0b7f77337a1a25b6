mod collector;
mod decode;
mod pipeline;
mod work;

pub use collector::*;
pub use decode::*;
pub use pipeline::*;
pub use work::*;
