pub mod executor;
pub mod supervisor;

pub use executor::{is_pass, ExecutorPolicy, SuiteExecutor, PASS_THRESHOLD};
pub use supervisor::{RunHandle, RunSupervisor, StartRequest};
