pub mod context;
pub mod error;
pub mod graph;
pub mod history;
pub mod task;

// Re-export commonly used types
pub use context::Context;
pub use error::{BoxError, GraphError, Result};
pub use graph::{ExecutionResult, Graph, GraphBuilder};
pub use history::{ConversationHistory, ConversationTurn, Role};
pub use task::{NextAction, Task, TaskResult};
