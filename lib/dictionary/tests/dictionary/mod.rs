mod concurrency;
mod encoding;
