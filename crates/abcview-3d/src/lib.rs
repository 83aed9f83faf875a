pub mod buffer;
pub mod pipeline;
pub mod render;

pub use buffer::DynamicBuffer;
pub use pipeline::{Uniforms, create_pipeline, create_uniform_layout};
pub use render::{RenderOptions, SceneRenderer};
