//! Cross-module test suites and the recording fakes they share.

pub mod helpers;
