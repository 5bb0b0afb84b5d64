//! Utility modules shared by the wiki and the server.

pub mod command;
pub mod git;
pub mod slug;
