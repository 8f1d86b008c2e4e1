//! Brezza is a small server-rendered blog: authenticated users publish short
//! text posts, optionally filed into a named group, and anyone can browse
//! posts newest-first with fixed-size pages.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
