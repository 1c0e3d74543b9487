//! Pipeline stages for financial report analysis.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on its own and the model provider can be swapped without
//! touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ encode ──▶ llm ──▶ postprocess ──▶ validate
//! (path/URL) (lopdf)   ([PAGE n]) (Gemini) (JSON recovery) (required keys)
//! ```
//!
//! 1. [`input`]: load the upload, local file or URL into memory
//! 2. [`extract`]: per-page text on the blocking pool; blank pages dropped
//!    but counted
//! 3. [`encode`]: mark pages for the text prompt, or base64 the whole PDF
//! 4. [`llm`]: the only stage with network I/O
//! 5. [`postprocess`]: strip fences, fall back to the brace-delimited slice
//! 6. [`validate`]: check the template's required top-level keys

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod validate;
