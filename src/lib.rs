// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Minimal real-time 3D rendering scaffold built on wgpu.
//!
//! Glint provides the three pieces a hand-rolled render loop composes:
//! a free-flying first-person camera, two-stage WGSL shader programs
//! with a name-based uniform interface, and image-backed 2D textures
//! with mipmaps. Window creation, mesh setup, pipelines, and draw calls
//! stay in the driver; the crate hands it the parts (shader modules,
//! pipeline layout, bind groups, view/projection matrices) it needs.
//!
//! # Key entry points
//!
//! - [`camera::core::Camera`] - the free-fly camera
//! - [`gpu::program::ShaderProgram`] - compile/link/uniform pipeline
//! - [`gpu::texture::Texture2D`] - decoded, mipmapped 2D textures
//! - [`gpu::render_context::RenderContext`] - wgpu bootstrap
//! - [`gpu::state::RenderState`] - driver-owned binding state
//!
//! # A frame, end to end
//!
//! Poll input → apply it to the camera with the frame's delta time →
//! activate a program (flushes its uniform staging) → bind textures to
//! units → build bind groups → record the draw. Everything here runs
//! synchronously on the calling thread; resource construction either
//! fully succeeds or fails with the underlying compiler's, linker's, or
//! decoder's diagnostic.

pub mod camera;
pub mod error;
pub mod gpu;
pub mod options;
pub mod util;
