//! Jotter: a small blogging platform with groups, comments and follow feeds.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
