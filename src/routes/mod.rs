pub mod auth;
pub mod health;
pub mod items;
pub mod links;
pub mod lists;
pub mod poll;
pub mod shares;
