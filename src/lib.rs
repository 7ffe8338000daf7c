//! Declarative, idempotent management of individual settings in HOCON files.
//!
//! You describe one setting as you want it to be (a file, a dotted setting
//! path, a value, optionally a type, and whether it should exist), and
//! hoconset tells you whether the file already matches. If it does not, it
//! applies the smallest edit that makes it match, and tells you what it did.
//!
//! ```ignore
//! let desired = DesiredSetting::from_title("server.port")
//!     .with_path("/etc/app.conf")
//!     .with_value(8080);
//! let outcome = apply_file(&desired, &Options::load(None)?)?;
//! println!("{outcome}"); // "server.port: value changed '80' to '8080'"
//! ```
//!
//! Running the same declaration again reports `in sync` and leaves the file
//! alone.
//!
//! # Types
//!
//! Every desired value has a [`TypeTag`], either given explicitly or inferred
//! from the value's shape. The tag decides how the value is validated and how
//! it is compared against what is already in the file:
//!
//! | Tag | Accepts | In sync when |
//! |-----|---------|--------------|
//! | `boolean` | `true` / `false` | equal |
//! | `number` | numbers, numeric strings | numerically equal |
//! | `string` | strings | equal |
//! | `text` | strings of raw HOCON | equal as text, or equal once parsed |
//! | `array` | arrays of any length | equal element for element, in order |
//! | `array_element` | a value or array of values | every element is an item, or a nested item, of the current array |
//! | `hash` | objects | deep-equal, key order ignored |
//!
//! Inference maps booleans, numbers, strings, objects and arrays of two or
//! more elements to the matching tag. A one-element array is ambiguous (a
//! whole array, or one element to add?) and is rejected with
//! [`SettingError::AmbiguousType`] unless the type is explicit.
//!
//! `array_element` is additive: it appends missing elements to an array that
//! must already exist and never removes anything. With `ensure = absent` it
//! removes just the listed elements. `text` values are written into the file
//! byte for byte, so hand-written formatting and comments inside them survive.
//!
//! # Layers
//!
//! The core does no I/O. [`in_sync`], [`sync`] and [`converge`] work against
//! any [`ConfigTree`], a small get/set/delete/append/render contract.
//! [`Document`] is the built-in implementation over a HOCON subset reader. It
//! splices each edit into the source text, so comments and formatting around
//! the changed field are kept. [`check_file`] and [`apply_file`] add file reading
//! and writing on top: a missing file is treated as empty, and the file is
//! only written when the setting actually changed.
//!
//! # Validation
//!
//! A [`DesiredSetting`] is loose input (it deserializes straight from a JSON
//! manifest). [`DesiredSetting::validate`] checks it in two steps. First every
//! required field is checked and all missing ones are reported together:
//!
//! ```text
//! Missing required fields: path, setting, value
//! ```
//!
//! Then the type name is parsed and the value is validated against it. Only
//! the resulting [`ResolvedSetting`] is accepted by the engine.
//!
//! # Options
//!
//! Rendering and file handling are configured through [`Options`], a
//! [confique](https://docs.rs/confique) struct layered from compiled
//! defaults, an optional TOML file (by default `hoconset/hoconset.toml` in the
//! platform config directory) and `HOCONSET_*` environment variables.
//!
//! # HOCON support
//!
//! The reader covers what settings files use in practice: objects, arrays,
//! dotted keys, `+=`, comments, quoted, triple-quoted and unquoted strings.
//! `include` directives and `${...}` substitutions are rejected with a parse
//! error. New fields are written with the layout set in [`RenderOptions`].
//! If an edit cannot be spliced into the text (for example after a `+=`
//! definition), the whole document is rewritten, and its comments are lost.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) provides
//! [`SettingArgs`], a derive struct with `--path`, `--setting`, `--value`,
//! `--type` and `--ensure`, converted with
//! [`into_desired()`](SettingArgs::into_desired).
//!
//! # Logging
//!
//! Convergence decisions and file writes are reported as
//! [tracing](https://docs.rs/tracing) events. The library installs no
//! subscriber.

pub mod error;
pub mod options;
pub mod types;
pub mod value;

mod change;
#[cfg(feature = "clap")]
mod cli;
mod converge;
mod edit;
mod infer;
mod parse;
mod path;
mod persist;
mod render;
mod setting;
mod tree;

#[cfg(test)]
mod fixtures;

pub use change::{ChangeDescription, Outcome};
#[cfg(feature = "clap")]
pub use cli::SettingArgs;
pub use converge::{converge, in_sync, sync};
pub use error::SettingError;
pub use infer::infer_and_validate;
pub use options::{Options, RenderOptions, Separator};
pub use parse::{parse_document, parse_text, parse_value};
pub use path::{SettingIdentifier, ensure_path, resolve};
pub use persist::{apply_file, check_file, converge_document};
pub use render::render_document;
pub use setting::{DesiredSetting, DesiredState, ResolvedSetting};
pub use tree::{ConfigTree, Document};
pub use types::{Ensure, TypeTag};
pub use value::{ConfigValue, Object};
