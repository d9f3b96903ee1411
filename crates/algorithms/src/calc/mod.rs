//! Dual-backend raster calculator
//!
//! Formulas are built as [`Expr`] trees, rendered into each backend's
//! textual dialect and evaluated by a [`CalcEngine`]. [`calculate_dual`]
//! runs the primary engine and falls back to the secondary when the
//! primary fails, erroring only when both do.

mod cellwise;
mod engine;
mod expr;
mod tiled;

pub use cellwise::CellwiseEngine;
pub use engine::{calculate_dual, calculate_dual_with, CalcEngine};
pub use expr::{
    combine_formula, parse_formula, scale_formula, tercile_class_formula, BinOp, CmpOp, Dialect,
    Expr, Operand,
};
pub use tiled::TiledEngine;
