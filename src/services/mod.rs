pub mod mailer;
pub use mailer::{LogMailer, MailMessage, MailQueue, Mailer};

pub mod identity_service;
pub mod identity_service_impl;
pub use identity_service::{IdentityError, IdentityService, PruneReport, Registration, Session};
pub use identity_service_impl::SeaOrmIdentityService;

pub mod group_service;
pub mod group_service_impl;
pub use group_service::{GroupError, GroupService, PageRequest};
pub use group_service_impl::SeaOrmGroupService;

pub mod membership_service;
pub mod membership_service_impl;
pub use membership_service::{MembershipError, MembershipService};
pub use membership_service_impl::SeaOrmMembershipService;
