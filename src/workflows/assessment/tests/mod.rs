mod common;
mod roi;
