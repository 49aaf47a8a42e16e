//! Pipeline stages for legal document analysis.
//!
//! Each submodule implements exactly one transformation step and is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ normalize ──▶ classify ──▶ render
//! (path/URL) (PDF/DOCX/  (model)  (cleanup)    (6 sections)  (labels)
//!             text)                                  │
//!                                                    └──▶ translate (summary)
//! ```
//!
//! 1. [`input`]: resolve a path, `-` or URL to bytes + media type
//! 2. [`extract`]: decode bytes to plain text; runs in `spawn_blocking`
//! 3. [`llm`]: drive the generation call with retry/backoff; the only
//!    stage with network I/O besides URL download
//! 4. [`normalize`]: strip fences, CRLF and invisible characters
//! 5. [`classify`]: route answer lines to the six fixed sections
//! 6. [`render`]: split section lines into label/value entries
//! 7. [`translate`]: optional summary translation

pub mod classify;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod render;
pub mod translate;
