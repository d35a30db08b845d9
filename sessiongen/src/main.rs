//! sessiongen: log in once, get a string session.
//!
//! ```text
//! API_ID=12345 API_HASH=0123abcd cargo run -p sessiongen
//! ```

use sessiongen::{Bootstrapper, RawCredentials, TelegramConnector, TerminalPrompter, banner, config};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    config::load_dotenv();
    banner::print();

    let mut boot = Bootstrapper::new(TelegramConnector, TerminalPrompter, std::io::stdout());

    let raw = match RawCredentials::from_env() {
        Ok(raw) => raw,
        Err(e) => boot.report_failure(&e.into()),
    };

    if let Err(e) = boot.run(&raw.api_id, &raw.api_hash).await {
        boot.report_failure(&e);
    }
}
