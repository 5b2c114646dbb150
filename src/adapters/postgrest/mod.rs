//! PostgREST (Supabase REST) adapter.

pub mod row_store;

pub use row_store::{PostgrestConfig, PostgrestRowStore};
