//! # Trace Tests
