pub mod cleaner;
pub mod fetcher;
pub mod llm;
pub mod pdf;
pub mod scraper;

pub use cleaner::HtmdCleaner;
pub use fetcher::{HostPolicy, ReqwestFetcher};
pub use llm::{AnthropicClient, OpenAiCompatClient, ProviderClient, ProviderClientFactory};
pub use pdf::PdfTextExtractor;
pub use scraper::HttpJobScraper;
