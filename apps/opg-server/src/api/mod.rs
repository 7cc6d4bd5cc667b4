pub mod chat;
pub mod invert;
pub mod meta;
pub mod sessions;
