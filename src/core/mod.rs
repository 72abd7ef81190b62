pub mod config;
pub mod locator;
pub mod logging;
pub mod page;
pub mod session;

pub use config::{ActionConfig, BrowserConfig, EngineConfig, LookupConfig, ResolutionConfig};
pub use locator::{Locator, LocatorRef, WaitState};
pub use logging::{LogSink, MemorySink, TracingSink};
pub use page::{PageBinding, PageHandle};
pub use session::{AuthenticatedContext, SessionCookie, SessionProvider};
