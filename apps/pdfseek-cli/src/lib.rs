//! Front-end helpers for the `pdfseek` binary: directory loading and result
//! rendering.

pub mod loader;
pub mod render;
