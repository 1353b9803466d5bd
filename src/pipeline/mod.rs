//! Pipeline stages for statement parsing.
//!
//! Each submodule implements one step, so each can be tested on its own and
//! the two external collaborators (pdfium, the LLM) can be swapped for stubs.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ extract ──▶ interpret ──▶ postprocess
//! (temp file) (pdfium)   (LLM)         (fences/JSON)
//! ```
//!
//! 1. [`upload`]      — read the multipart field and write it to a unique temp file
//! 2. [`extract`]     — pull the text layer of every page; runs in `spawn_blocking`
//! 3. [`interpret`]   — one LLM call with the statement prompt; the only network I/O
//! 4. [`postprocess`] — strip code fences and parse the reply as a JSON object

pub mod extract;
pub mod interpret;
pub mod postprocess;
pub mod upload;
