pub mod context;
pub mod diagnostic;
pub mod expr;
pub mod filter;
pub mod scanner;
pub mod walker;

pub use context::{resolve_bindings, DerivationRule, VariableBindings};
pub use diagnostic::{Diagnostics, ErrorKind, Location, RenderError, RenderWarning, WarningKind};
pub use expr::{Evaluator, Expression};
pub use filter::Filter;
pub use scanner::{Delimiters, Placeholder, Scanner, Token};
pub use walker::{RenderResult, Renderer};
