//! Database repositories
//!
//! One repository per table. Each exposes an `async_trait` interface and a
//! `Sqlx*` implementation that dispatches on the configured driver.

pub mod blog_post;
pub mod contact_message;
pub mod session;
pub mod user;

pub use blog_post::{BlogPostRepository, SqlxBlogPostRepository};
pub use contact_message::{ContactMessageRepository, SqlxContactMessageRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
