/// Middleware modules for the API server
///
/// Authentication lives next to the router in `app`; this module holds the
/// response hardening layer.

pub mod security;
