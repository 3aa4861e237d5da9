/// Host media capabilities
///
/// The flow never talks to the operating system directly; it asks a
/// `MediaHost` for permission and for a single picked image. The desktop
/// implementation lives in `desktop.rs`, tests supply their own.

pub mod desktop;

use async_trait::async_trait;

use crate::state::data::ImageHandle;

pub use desktop::DesktopHost;

/// Answer to a media-library permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn request_permission(&self) -> Permission;

    /// `None` when the user cancels
    async fn pick_image(&self) -> Option<ImageHandle>;
}
