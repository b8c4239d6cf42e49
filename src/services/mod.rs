pub mod accounts;
pub mod directory;
pub mod dispatch;
pub mod reader;
