mod dbpedia;
mod sparql;

pub use dbpedia::*;
