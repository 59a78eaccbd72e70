pub mod context;
pub mod graphics;
pub mod overlay;
pub mod session;
pub mod tween;

pub use context::{RenderTarget, ViewerContext};
pub use graphics::{Graphics, RcWindow, Viewport, create_graphics};
pub use overlay::Overlay;
pub use session::{LoadOutcome, LoadSession, SessionPhase};
