//! Route assembly: public and bearer-protected route groups.

pub mod api_routes;
pub mod router;

pub use router::create_router;
