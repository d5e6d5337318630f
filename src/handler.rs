pub mod book;
pub mod role;
pub mod user;
