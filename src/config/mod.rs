mod scan;
mod server;

pub use scan::ScanConfig;
pub use server::ServerConfig;
