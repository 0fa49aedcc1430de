//! Dashboard serving

pub mod dashboard;

pub use dashboard::{
    create_router, serve_dashboard, start_dashboard, DashboardApi, DashboardSummary,
};
