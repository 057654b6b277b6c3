//! # Voxel World Entry Point
//!
//! This is the main entry point for the headless demo of the voxel world.
//! It simply calls into the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- config.json
//! ```

fn main() {
    voxel_world::run();
}
