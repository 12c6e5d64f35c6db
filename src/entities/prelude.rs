pub use super::api_tokens::Entity as ApiTokens;
pub use super::group_requests::Entity as GroupRequests;
pub use super::groups::Entity as Groups;
pub use super::groups_users::Entity as GroupsUsers;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::users::Entity as Users;
