//! Generator of ownership-aware C++ wrapper headers for C libraries.
//!
//! cppfier reads the declarations of a C library's headers and emits one C++
//! header per input. Each opaque handle with a constructor and destructor
//! pair becomes an owning class, a non-owning `Ref` class and a `Param`
//! adapter for parameters. Functions become inline forwarders, and those
//! taking a handle also become methods. Enums and constants become
//! `constexpr` values that keep the library's own values.
//!
//! ```
//! use cppfier::{generate, Input, Opt};
//!
//! let header = "
//!     typedef struct SDL_Window SDL_Window;
//!     SDL_Window *SDL_CreateWindow(const char *title, int w, int h);
//!     void SDL_DestroyWindow(SDL_Window *window);
//! ";
//! let mut opt = Opt::default();
//! opt.namespace = Some("SDL".to_owned());
//! opt.prefixes = vec!["SDL_".to_owned()];
//!
//! let generation = generate(&[Input::new("SDL_video.h", "video.hpp", header)], &opt);
//! assert!(generation.is_clean());
//! assert!(generation.files[0].content.contains("class Window"));
//! ```
//!
//! The `cppfier` command wraps this library for use from build systems and
//! can check generated output against committed headers.

#![allow(
    clippy::enum_glob_use,
    clippy::items_after_statements,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::new_without_default,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::toplevel_ref_arg,
    clippy::uninlined_format_args
)]

pub mod config;
mod error;
mod gen;
pub mod harness;
pub mod syntax;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::gen::{
    default_output_name, generate, EmittedConstant, FileReport, GeneratedFile, Generation, Input,
    Opt, CONSTRUCTOR_VERBS, DESTRUCTOR_VERBS,
};
pub use crate::syntax::report::{Diagnostic, Severity};
