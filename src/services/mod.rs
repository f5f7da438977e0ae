pub mod access;
pub mod active_list;
pub mod change_feed;
pub mod credentials;
pub mod init;
pub mod items;
pub mod share_links;
