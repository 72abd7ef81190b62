#[cfg(feature = "chrome")]
pub mod chrome;

#[cfg(feature = "chrome")]
pub use chrome::{ChromeBrowser, ChromeLocator, ChromePage};
