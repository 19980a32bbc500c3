//! Services layer - Business logic
//!
//! Services validate input, apply the site's rules and coordinate
//! repositories and outbound mail. Handlers never touch repositories directly.

pub mod blog;
pub mod contact;
pub mod email;
pub mod markdown;
pub mod password;
pub mod slug;
pub mod user;

pub use blog::{BlogService, BlogServiceError};
pub use contact::{ContactService, ContactServiceError};
pub use email::{mailer_from_config, DisabledMailer, Mailer, OutgoingMail, SmtpMailer};
pub use markdown::{ContentRenderer, MarkdownRenderer};
pub use password::{hash_password, verify_password};
pub use slug::{generate_slug, is_valid_slug};
pub use user::{LoginInput, ProvisionOutcome, UserService, UserServiceError};
