pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod export;
pub mod feed;
pub mod filter;
pub mod fs_util;
pub mod geometry;
pub mod hub;
pub mod interrupt;
pub mod output;
pub mod query;
pub mod scene;
pub mod session;
pub mod store;
