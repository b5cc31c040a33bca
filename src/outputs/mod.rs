//! Output generation for digest runs.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── 2025-05-06/
//! │   ├── morning.json
//! │   ├── afternoon.json
//! │   └── evening.json
//! ```

pub mod json;
