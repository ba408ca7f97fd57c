pub mod aggregate;
pub mod exec;
pub mod render;

pub use aggregate::density_grid;
pub use exec::exec;
pub use render::render_heatmap;
