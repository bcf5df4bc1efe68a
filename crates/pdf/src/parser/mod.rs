pub mod backend;
pub mod encoding;
pub mod layout;
