pub mod app;
pub mod auth_builder;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::build_router;
pub use app::build_router_with_body_limit;
