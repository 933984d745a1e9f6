// Engine module - the universe's simulation and presentation components.
// main.rs owns the window, GPU objects, and the per-frame tick order.

pub mod camera;
pub mod components;
pub mod director;
pub mod focus;
pub mod hud;
pub mod input;
pub mod layout;
pub mod neighbors;
pub mod picker;
pub mod scene;
pub mod star;
pub mod stream;

// Re-export commonly used items
pub use camera::OrbitCamera;
pub use director::{CameraDirector, CameraMode, CruiseConfig, DirectorInputs};
pub use focus::{FocusState, SessionPhase};
pub use input::InputState;
pub use picker::CruiseTargetPicker;
pub use scene::SceneState;
pub use star::{Star, StarField, StarId};
