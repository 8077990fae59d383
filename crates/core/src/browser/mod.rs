//! Headless browser abstraction.
//!
//! The image host rejects requests that do not carry the gallery page as
//! `Referer`, so images are fetched from inside a real browser page. This
//! module provides the `BrowserLauncher` / `BrowserInstance` / `BrowserPage`
//! seam and a Chromium implementation driven over CDP.

mod chromium;
mod error;
mod traits;

pub use chromium::ChromiumLauncher;
pub use error::{BrowserError, BrowserStage};
pub use traits::{BrowserInstance, BrowserLauncher, BrowserPage};
