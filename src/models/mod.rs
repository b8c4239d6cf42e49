pub mod account;
pub mod dispatch;
pub mod driver;
pub mod reference;
pub mod store;
