//! Avatar fetcher port.

use std::future::Future;
use std::pin::Pin;

use crate::error::QuoteError;

/// Boxed future type returned by [`AvatarFetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, QuoteError>> + Send + 'a>>;

/// Downloads encoded avatar images.
pub trait AvatarFetcher: Send + Sync {
    /// Fetch the raw bytes behind `url`.
    fn fetch(&self, url: String) -> FetchFuture<'_>;
}
