pub mod event;
pub mod organization;
pub mod ticket;
pub mod user;
