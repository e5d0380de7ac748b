pub mod utils_transports;
