//! Tool definitions, argument templates, and the per-adapter registry.

pub mod core;
pub mod spec;
pub mod template;

pub use self::core::{CommandTool, Tool, ToolContext, ToolDef, ToolSet};
pub use self::spec::ToolSpec;
pub use self::template::{ArgPart, ArgTemplate};
