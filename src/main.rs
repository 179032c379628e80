mod ui;

use log::error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = ui::main_window::run().await {
        error!("{}", err);
        eprintln!("chatsync: {}", err);
        std::process::exit(1);
    }
}
