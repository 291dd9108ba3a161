// Domain layer - Grid geometry, placement algorithms and interaction sessions
pub mod breakpoint;
pub mod collision;
pub mod compactor;
pub mod dashboard;
pub mod geometry;
pub mod grid_math;
pub mod panel;
pub mod position_finder;
pub mod repair;
pub mod session;
