pub mod auth;
pub mod group;
pub mod post;
pub mod profile;
