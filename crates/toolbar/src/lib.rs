mod dispatch;
mod geometry;
mod platform;
mod render;
mod state;
mod toolbar;
mod transitions;

pub use crate::dispatch::*;
pub use crate::geometry::*;
pub use crate::platform::*;
pub use crate::render::*;
pub use crate::state::*;
pub use crate::toolbar::*;
pub use crate::transitions::*;
