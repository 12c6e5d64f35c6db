pub mod prelude;

pub mod api_tokens;
pub mod group_requests;
pub mod groups;
pub mod groups_users;
pub mod password_reset_tokens;
pub mod users;
