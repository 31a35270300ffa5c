//! Recipe Keeper: extract recipes from web pages and photos with a
//! generative model, keep them in a document store, and browse/search
//! them in a Hebrew, right-to-left web UI.
//!
//! The crate is organised along the request flow: [`extract`] turns a
//! source into a [`model::Recipe`] (calling [`providers`] and
//! [`images`]), [`store`] persists it, and [`web`] drives the three-tab
//! workflow with per-session state from [`session`].

pub mod config;
pub mod error;
pub mod extract;
pub mod i18n;
pub mod images;
pub mod model;
pub mod providers;
pub mod session;
pub mod store;
pub mod web;

pub use error::KeeperError;
pub use model::Recipe;
