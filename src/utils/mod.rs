pub mod error;
pub mod pagination;
pub mod qr;
pub mod response;
