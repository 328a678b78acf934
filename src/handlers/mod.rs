pub mod auth;
pub mod catalog;
pub mod dishes;
pub mod favorites;
pub mod profile;
pub mod templates;
pub mod upload;
pub mod users;
pub mod view_history;
