use std::path::Path;

use cache_types::PageId;
use rand::rngs::{StdRng, ThreadRng};
use rand::{thread_rng, Rng, SeedableRng};

#[cfg(test)]
pub const PAGE_LEN: u32 = 16 << 10;
#[cfg(not(test))]
pub const PAGE_LEN: u32 = 1 << 20;

pub fn print_directory_contents(path: &Path) {
    match std::fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok(entry) => {
                        let path = entry.path();
                        println!("{}", path.display());

                        if path.is_dir() {
                            print_directory_contents(&path);
                        }
                    },
                    Err(e) => eprintln!("Error reading entry: {}", e),
                }
            }
        },
        Err(e) => eprintln!("Error reading directory: {}", e),
    }
}

pub fn random_page_id(rng: &mut impl Rng) -> PageId {
    PageId::new(format!("{:016x}", rng.gen::<u64>()), rng.gen::<u32>() as u64)
}

pub fn random_page(rng: &mut impl Rng, len: u32) -> Vec<u8> {
    (0..len).map(|_| rng.gen()).collect()
}

/// Generates (page id, page bytes) pairs, deterministic when seeded.
#[derive(Debug)]
pub struct RandomPageIterator<T: Rng> {
    rng: T,
    page_len: u32,
    file_id: Option<String>,
}

impl<T: Rng> RandomPageIterator<T> {
    pub fn new(rng: T) -> Self {
        Self {
            rng,
            page_len: PAGE_LEN,
            file_id: None,
        }
    }

    pub fn with_page_len(mut self, len: u32) -> Self {
        self.page_len = len;
        self
    }

    /// keep every generated page in the same file
    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }
}

impl<T: SeedableRng + Rng> RandomPageIterator<T> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(T::seed_from_u64(seed))
    }
}

impl RandomPageIterator<StdRng> {
    pub fn std_from_seed(seed: u64) -> Self {
        Self::from_seed(seed)
    }
}

impl Default for RandomPageIterator<ThreadRng> {
    fn default() -> Self {
        Self::new(thread_rng())
    }
}

impl<T: Rng> Iterator for RandomPageIterator<T> {
    type Item = (PageId, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut page_id = random_page_id(&mut self.rng);
        if let Some(file_id) = &self.file_id {
            page_id.file_id = file_id.clone();
        }
        let page = random_page(&mut self.rng, self.page_len);
        Some((page_id, page))
    }
}
