pub mod info_api;
pub mod registry;
pub mod types;

pub use info_api::InfoApiTool;
pub use registry::ToolRegistry;
pub use types::*;
