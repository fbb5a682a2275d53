//! # routerdesk-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for programmatic access and for the DHCP daemon's
//!   lease hook (`/api/dhcp/servers`, `/api/services/{kind}`, …)
//! - Serve a **server-side-rendered HTML dashboard** that works with
//!   **zero JavaScript**: entity tables, forms and the per-server dialog are
//!   rendered from the view models of `routerdesk-app`
//! - Map HTTP requests into [`ConfigBackend`](routerdesk_app::ports::ConfigBackend)
//!   calls (driving adapter)
//! - Map application results into HTTP responses (JSON or HTML)
//!
//! ## No-JS dashboard approach
//! - Every page is rendered server-side as complete HTML.
//! - Forms POST back to the server; a successful save redirects (PRG
//!   pattern), a rejected one re-renders the form with its errors.
//! - Deletes go through a confirmation page.
//!
//! ## Dependency rule
//! Depends on `routerdesk-app` (for the backend contract and view models) and
//! `routerdesk-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod dashboard;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
