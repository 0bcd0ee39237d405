//! Source fetchers: where raw configuration bytes come from.

mod fetcher;
mod file;

#[cfg(feature = "remote")]
mod remote;

pub use fetcher::Fetcher;
pub use file::LocalFileFetcher;

#[cfg(feature = "remote")]
pub use remote::{DEFAULT_HTTP_TIMEOUT, HttpAuth, RemoteFetcher, RemoteFetcherBuilder};
