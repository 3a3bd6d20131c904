use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use cache_reader::metrics::cache_hit_rate;
use cache_reader::{CloseableSupplier, FileStatus, LocalCachePositionReader, PositionReader, ReaderConfig, StreamReader};
use clap::Parser;
use page_cache::{get_cache, CacheConfig, MemoryCache, PageCache, PAGE_CACHE_SIZE_BYTES};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use utils::constant_declarations::ENV_VAR_PREFIX;

/// Default log level. Override using `RUST_LOG` env variable.
#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: &str = "warn";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Parser)]
struct CatRangeArgs {
    /// local file standing in for the external storage
    #[clap(long, short)]
    file: PathBuf,
    #[clap(long, short, default_value_t = 0)]
    offset: u64,
    /// bytes to read, defaults to the rest of the file
    #[clap(long, short)]
    length: Option<usize>,
    /// disk cache root, pages are kept in memory if not set
    #[clap(long)]
    cache_dir: Option<PathBuf>,
    #[clap(long)]
    cache_size: Option<u64>,
    #[clap(long)]
    page_size: Option<u64>,
    /// numeric file id; without one, pages are keyed by a hash of the path unless
    /// LOCALCACHE_PATH_HASH_FILE_ID says otherwise
    #[clap(long)]
    file_id: Option<u64>,
    /// read the range this many times, every pass after the first should hit the cache
    #[clap(long, default_value_t = 1)]
    repeat: usize,
}

fn init_logging() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
        .unwrap_or_default();

    tracing_subscriber::registry().with(fmt_layer).with(filter_layer).init();
}

fn reader_config(args: &CatRangeArgs) -> ReaderConfig {
    let mut config = ReaderConfig::default();
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    // a local path has no file id of its own, identify it by its path unless configured
    let configured = std::env::var_os(format!("{ENV_VAR_PREFIX}PATH_HASH_FILE_ID")).is_some();
    if args.file_id.is_none() && !configured {
        config.path_hash_file_id = true;
    }
    config
}

/// Usage: ./cat_range --file "path" [--offset N] [--length N] [--cache-dir "cache root"]
/// writes the requested range of the file to stdout, read through the page cache
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = CatRangeArgs::parse();

    let cache_size = args.cache_size.unwrap_or(*PAGE_CACHE_SIZE_BYTES);
    let cache: Arc<dyn PageCache> = match &args.cache_dir {
        Some(cache_directory) => get_cache(&CacheConfig {
            cache_directory: cache_directory.clone(),
            cache_size,
        })?,
        None => Arc::new(MemoryCache::new(cache_size)?),
    };

    let config = reader_config(&args);
    let file_length = std::fs::metadata(&args.file)?.len();
    let ufs_path = args.file.to_string_lossy().into_owned();
    let status = FileStatus::new(args.file_id.unwrap_or(0), file_length, ufs_path);
    let path = args.file.clone();
    let supplier = CloseableSupplier::new(move || File::open(path).map(StreamReader::new));
    let reader = LocalCachePositionReader::new(status, supplier, cache, &config)?;

    let length = args.length.unwrap_or(file_length.saturating_sub(args.offset) as usize);
    let mut buffer = vec![0u8; length];
    let mut stdout = std::io::stdout().lock();
    for pass in 0..args.repeat.max(1) {
        let outcome = reader.position_read(args.offset, &mut buffer, length)?;
        if pass == 0 {
            stdout.write_all(&buffer[..outcome.bytes()])?;
        }
        info!("pass {pass}: {outcome:?}, cache hit rate {:.3}", cache_hit_rate());
    }
    stdout.flush()?;
    reader.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{reader_config, CatRangeArgs};

    // one test, the env var is process wide
    #[test]
    fn test_path_hash_file_id_selection() {
        let key = "LOCALCACHE_PATH_HASH_FILE_ID";
        std::env::remove_var(key);

        let args = CatRangeArgs::parse_from(["cat_range", "--file", "data.bin", "--page-size", "4096"]);
        let config = reader_config(&args);
        assert!(config.path_hash_file_id);
        assert_eq!(config.page_size, 4096);

        let args = CatRangeArgs::parse_from(["cat_range", "--file", "data.bin", "--file-id", "5"]);
        assert!(!reader_config(&args).path_hash_file_id);

        // an explicit setting in the environment is left alone
        std::env::set_var(key, "false");
        let args = CatRangeArgs::parse_from(["cat_range", "--file", "data.bin"]);
        assert!(!reader_config(&args).path_hash_file_id);
        std::env::remove_var(key);
    }
}
