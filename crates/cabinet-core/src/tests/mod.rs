mod export;
mod helpers;
