//! Common imports for building and driving adapters.

pub use crate::adapter::{Adapter, AdapterInfo, AdapterSet, AdapterSpec};
pub use crate::config::FrameworkConfig;
pub use crate::error::{RegistrationError, ToolError, ValidationError};
pub use crate::lifecycle::{LifecycleState, LifecycleStatus, ProbeSpec};
pub use crate::result::{ProcessOutput, ToolResult};
pub use crate::retry::RetryConfig;
pub use crate::runner::{CommandRunner, CommandSpec, ProcessRunner, RecordingRunner};
pub use crate::tools::{ArgPart, Tool, ToolDef, ToolSet, ToolSpec};
pub use crate::validate::{LanguageRiskProfile, ParamKind, ParamSpec};
