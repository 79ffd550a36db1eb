pub mod qr;
pub mod theme;

pub use qr::*;
pub use theme::*;
