pub mod expression;
pub mod function;
pub mod registry;
pub mod value;

pub use expression::{Call, EvalContext, ExpressionError, ExpressionResult, Literal, PropertyPath};
pub use function::{BackendTarget, Function, FunctionMode};
pub use registry::{Registry, RegistryConfig};
pub use value::{Value, ValueType};
