mod conv;
mod group_conv;
mod inception;
mod strides;

pub use conv::*;
pub use group_conv::*;
pub use inception::*;
pub use strides::*;
