pub mod backend;
pub mod exchange_rate_api;
pub mod util;

pub use backend::BackendClient;
pub use exchange_rate_api::ExchangeRateApiProvider;
