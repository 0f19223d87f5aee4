pub mod bench;
pub mod graph;
pub mod io;
pub mod seed;
