pub mod api_token;
pub mod group;
pub mod group_request;
pub mod password_reset;
pub mod user;
