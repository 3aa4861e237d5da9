use async_trait::async_trait;
use image::ImageFormat;
use rfd::AsyncFileDialog;
use tracing::info;

use super::{MediaHost, Permission};
use crate::state::data::ImageHandle;

/// Formats offered in the picker (common camera and phone exports)
const PICKABLE_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Native file dialog as the media picker
#[derive(Debug, Default, Clone)]
pub struct DesktopHost;

impl DesktopHost {
    pub fn new() -> Self {
        Self
    }
}

/// Every file extension the picker accepts, lower-case
pub fn image_extensions() -> Vec<&'static str> {
    PICKABLE_FORMATS
        .iter()
        .flat_map(|format| format.extensions_str().iter().copied())
        .collect()
}

#[async_trait]
impl MediaHost for DesktopHost {
    /// Desktop file dialogs run with the user's own file access
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn pick_image(&self) -> Option<ImageHandle> {
        let extensions = image_extensions();
        let file = AsyncFileDialog::new()
            .set_title("Select a Leaf Photo")
            .add_filter("Images", extensions.as_slice())
            .pick_file()
            .await?;

        let path = file.path().to_path_buf();
        info!("🖼️  Picked {}", path.display());
        Some(ImageHandle::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        let extensions = image_extensions();
        for ext in ["jpg", "jpeg", "png", "webp"] {
            assert!(extensions.contains(&ext), "missing {ext}");
        }
        assert!(!extensions.contains(&"nef"));
    }

    #[tokio::test]
    async fn test_desktop_permission_granted() {
        assert_eq!(DesktopHost::new().request_permission().await, Permission::Granted);
    }
}
