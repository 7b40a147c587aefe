//! Cavity remeshing algorithms.
//!
//! - **Matching**: side-length fitting of catalog patterns ([`matcher`]),
//!   built on fraction-free integer row reduction ([`echelon`])
//! - **Remeshing**: pattern subdivision and Coons-patch filling ([`remesh`])
//! - **Small cavities**: valence-driven filling from the disk library
//!   ([`small_cavity`])
//! - **Smoothing**: Laplacian relaxation of generated vertices ([`smooth`])

pub mod echelon;
pub mod matcher;
pub mod remesh;
pub mod small_cavity;
pub mod smooth;
