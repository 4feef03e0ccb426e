pub mod dispatcher;
pub mod settings;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use settings::DispatchSettings;
