//! # BivarGis Algorithms
//!
//! Raster processing for bivariate tercile classification:
//!
//! - **align**: Warp a raster onto a reference grid (bilinear, CRS-aware)
//! - **calc**: Dual-backend raster calculator with automatic failover
//! - **statistics**: Tercile boundaries and classification
//! - **pipeline**: The bivariate orchestrator tying the stages together

pub mod align;
pub mod calc;
pub mod pipeline;
pub mod statistics;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::align::{align, AlignTarget};
    pub use crate::calc::{calculate_dual, CalcEngine, CellwiseEngine, Expr, Operand, TiledEngine};
    pub use crate::pipeline::{run_bivariate, BivariateOutput, BivariateParams, OutputPaths};
    pub use crate::statistics::{classify_terciles, tercile_boundaries};
    pub use bivargis_core::prelude::*;
}
