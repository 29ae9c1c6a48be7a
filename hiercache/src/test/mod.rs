mod coherence;
mod concurrency;
mod util;
