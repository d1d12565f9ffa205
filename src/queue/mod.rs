pub mod conditions;
pub mod execution;
pub mod guard;
pub mod manager;
pub mod scheduler;
pub mod store;
pub mod types;


pub use conditions::*;
pub use guard::*;
pub use manager::*;
pub use scheduler::*;
pub use store::*;
pub use types::*;
