//! Data models
//!
//! Database entities (User, Session, ContactMessage, BlogPost) and the input
//! types accepted by the services.

mod blog_post;
mod contact_message;
mod session;
mod user;

pub use blog_post::{BlogPost, BlogPostInput, ContentFormat};
pub use contact_message::{ContactMessage, ContactMessageInput};
pub use session::Session;
pub use user::User;
