pub mod clock;
pub mod js_executor;
pub mod retry;
pub mod settle;

pub use clock::{Clock, ManualClock, TokioClock};
pub use js_executor::JsExecutor;
pub use retry::{retry_until, RetryPolicy};
pub use settle::{wait_dom_idle, MUTATION_TICK_JS};
