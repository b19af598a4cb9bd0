//! Cross-module scenario tests.

mod pipeline;
mod support;
