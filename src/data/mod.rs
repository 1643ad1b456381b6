//! The results grid engine.
//!
//! A `ResultSet` is never modified once produced. Each stage derives a view
//! from it: visibility, filter, sort, pagination and virtualization, with
//! `GridView` tying them together and caching stage outputs.

pub mod result_set;

// Pipeline stages
pub mod cell_compare;
pub mod column_filter;
pub mod column_visibility;
pub mod pagination;
pub mod row_sorter;
pub mod virtualizer;

pub mod grid_renderer;
pub mod grid_view;

pub mod data_exporter;
