pub mod qr_client;
pub mod traits;

pub use qr_client::QrClient;
pub use traits::ImageFetcher;
