pub mod disk;
pub mod staged;
pub mod traits;

use std::io;
use std::path::PathBuf;

use crate::{error::Result, models::QrImage};

pub use disk::DirectorySink;
pub use staged::StagedImage;
pub use traits::ImageSink;

/// `<prefix><first `max_chars` chars of text>.<extension>`.
///
/// Characters that cannot appear in a file name are replaced with `_`,
/// one for one, after truncation.
pub fn suggested_filename(prefix: &str, text: &str, max_chars: usize, extension: &str) -> String {
    let stem: String = text
        .chars()
        .take(max_chars)
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}{}.{}", prefix, stem, extension)
}

/// Stages the image, hands it to the sink, then releases the staged copy
/// whatever the sink returned.
pub async fn save_image(image: &QrImage, sink: &dyn ImageSink, name: &str) -> Result<PathBuf> {
    let staged = stage_blocking(image.bytes.clone()).await?;
    let result = sink.save(&staged, name).await;
    staged.release();
    result
}

/// Writes the staged copy on the blocking pool.
async fn stage_blocking(bytes: Vec<u8>) -> Result<StagedImage> {
    tokio::task::spawn_blocking(move || StagedImage::stage(&bytes))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}
