//! Integration tests against real SQLite files and mock HTTP servers

mod cache;
mod end_to_end;
mod http_provider;
mod opinion;
