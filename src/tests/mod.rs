//! Cross-module tests for the scoring pipeline and the command line.
