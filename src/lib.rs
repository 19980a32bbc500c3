//! Aptinnova - company marketing site
//!
//! This library provides the site's pages, the contact form with staff email
//! notification, and the admin-managed blog.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
