pub mod model;
pub mod observability;
pub mod rate_limiting;
pub mod routes;
pub mod scheduler;
pub mod services;
pub mod startup;
pub mod templates;
