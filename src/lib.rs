pub mod cli;
pub mod rsa;
pub mod util;
