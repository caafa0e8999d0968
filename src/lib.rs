pub mod cdt;
pub mod color;
pub mod config;
pub mod drawer;
pub mod error;
pub mod figure;
pub mod labels;
pub mod layout;
pub mod map;
pub mod matrix;
pub mod transform;
pub mod tree;
pub mod view;
pub mod viewport;

pub use cdt::{CdtFile, load_cdt};
pub use config::RenderConfig;
pub use figure::Figure;
pub use layout::{Layout, StructuredDrawingArea};
