//! In-memory adapters for tagging persistence.

mod tags;

pub use tags::InMemoryTagRepository;
