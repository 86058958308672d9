mod query;
mod searcher;
mod store;

pub use searcher::SqliteActivitySearcher;
pub use store::SqliteActivityStore;
