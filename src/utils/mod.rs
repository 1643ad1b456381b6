//! Small formatting helpers shared by the grid and the workbench

pub mod format;
