#![doc = "blog-feed-core: core logic library for blog-feed."]

//! This crate contains the data model and pipeline that turn a directory of
//! Markdown files in a hosted repository into a sorted blog feed.
//!
//! # Usage
//! Build a [`download::PostDownloader`] around a [`contract::ContentHost`]
//! (usually [`github::GitHubClient`]), hand it to a
//! [`synchronise::FeedPublisher`], and subscribe to its state.

pub mod config;
pub mod contract;
pub mod download;
pub mod github;
pub mod post;
pub mod render;
pub mod synchronise;
pub mod theme;
