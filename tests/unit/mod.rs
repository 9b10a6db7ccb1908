//! Unit tests for the normalizer and company directory

mod directory;
